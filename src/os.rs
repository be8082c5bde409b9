use crate::decision::EvaluationDecision;
use crate::script::ConditionKind;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    Linux,
    Mac,
    Windows,
    Solaris,
    Aix,
    FreeBsd,
    OpenBsd,
    Other,
}

impl Os {
    pub fn current() -> Os {
        Os::from_target(std::env::consts::OS)
    }

    /// Map a target OS name (as in `std::env::consts::OS`).
    pub fn from_target(name: &str) -> Os {
        match name {
            "linux" => Os::Linux,
            "macos" => Os::Mac,
            "windows" => Os::Windows,
            "solaris" | "illumos" => Os::Solaris,
            "aix" => Os::Aix,
            "freebsd" => Os::FreeBsd,
            "openbsd" => Os::OpenBsd,
            _ => Os::Other,
        }
    }

    pub fn is_current_os(self) -> bool {
        self == Os::current()
    }
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Os::Linux => "linux",
            Os::Mac => "mac",
            Os::Windows => "windows",
            Os::Solaris => "solaris",
            Os::Aix => "aix",
            Os::FreeBsd => "freebsd",
            Os::OpenBsd => "openbsd",
            Os::Other => "other",
        };
        f.write_str(name)
    }
}

/// `EnabledOnOs`/`DisabledOnOs` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsDeclaration {
    pub kind: ConditionKind,
    pub os: Vec<Os>,
}

impl OsDeclaration {
    pub fn enabled_on(os: impl IntoIterator<Item = Os>) -> Self {
        Self { kind: ConditionKind::Enable, os: os.into_iter().collect() }
    }

    pub fn disabled_on(os: impl IntoIterator<Item = Os>) -> Self {
        Self { kind: ConditionKind::Disable, os: os.into_iter().collect() }
    }

    /// Decide this declaration against the running system.
    pub fn evaluate(&self) -> EvaluationDecision {
        evaluate_os(self.kind, Some(self.os.as_slice()))
    }
}

/// Decide the `kind` OS condition of a test element against the running
/// system. `declaration` is the element's OS declaration of that kind, if any.
pub fn evaluate_os(kind: ConditionKind, declaration: Option<&[Os]>) -> EvaluationDecision {
    evaluate_os_for(kind, declaration, Os::current())
}

/// Like [`evaluate_os`], against an explicit `current` system.
pub fn evaluate_os_for(
    kind: ConditionKind,
    declaration: Option<&[Os]>,
    current: Os,
) -> EvaluationDecision {
    let Some(os) = declaration else {
        return EvaluationDecision::enabled(format!("{kind}Os is not present"));
    };
    let listed = os.contains(&current);
    let enabled = match kind {
        ConditionKind::Enable => listed,
        ConditionKind::Disable => !listed,
    };
    if enabled {
        EvaluationDecision::enabled(format!("Enabled on operating system: {current}"))
    } else {
        EvaluationDecision::disabled(format!("Disabled on operating system: {current}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn target_names() {
        assert_eq!(Os::from_target("macos"), Os::Mac);
        assert_eq!(Os::from_target("illumos"), Os::Solaris);
        assert_eq!(Os::from_target("haiku"), Os::Other);
        assert!(Os::current().is_current_os());
    }

    fn decide_on(decl: &OsDeclaration, current: Os) -> EvaluationDecision {
        evaluate_os_for(decl.kind, Some(decl.os.as_slice()), current)
    }

    #[test]
    fn enabled_on_listed_os() {
        let decl = OsDeclaration::enabled_on([Os::Linux, Os::Mac]);
        assert_eq!(
            decide_on(&decl, Os::Linux),
            EvaluationDecision::enabled("Enabled on operating system: linux")
        );
        assert_eq!(
            decide_on(&decl, Os::Windows),
            EvaluationDecision::disabled("Disabled on operating system: windows")
        );
    }

    #[test]
    fn disabled_on_listed_os() {
        let decl = OsDeclaration::disabled_on([Os::Windows]);
        assert!(decide_on(&decl, Os::Windows).is_disabled());
        assert!(decide_on(&decl, Os::Other).enabled);
    }

    #[test]
    fn absent_declaration_names_its_kind() {
        assert_eq!(
            evaluate_os(ConditionKind::Enable, None),
            EvaluationDecision::enabled("@EnabledIfOs is not present")
        );
        assert_eq!(
            evaluate_os(ConditionKind::Disable, None),
            EvaluationDecision::enabled("@DisabledIfOs is not present")
        );
    }

    #[test]
    fn empty_set_matches_nothing() {
        let enable = OsDeclaration::enabled_on([]);
        assert_eq!(
            decide_on(&enable, Os::Linux),
            EvaluationDecision::disabled("Disabled on operating system: linux")
        );
        let disable = OsDeclaration::disabled_on([]);
        assert_eq!(
            decide_on(&disable, Os::Linux),
            EvaluationDecision::enabled("Enabled on operating system: linux")
        );
    }

    #[test]
    fn current_os_always_matches_itself() {
        assert!(OsDeclaration::enabled_on([Os::current()]).evaluate().enabled);
        assert!(OsDeclaration::disabled_on([Os::current()]).evaluate().is_disabled());
    }
}
