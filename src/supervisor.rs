use crate::actor::Directive;

/// A Cell's supervision policy: either a fixed directive applied to every
/// child failure, or a function of the failure reason. The Guardian always
/// uses the fixed form (`SystemSettings::guardian_directive`); ordinary actors
/// use whatever `Actor::supervisor_strategy` returns, wrapped here so both
/// shapes flow through the same decision point.
#[derive(Clone)]
pub enum SupervisorStrategy {
    Fixed(Directive),
    ByReason(std::sync::Arc<dyn Fn(&str) -> Directive + Send + Sync>),
}

impl SupervisorStrategy {
    pub fn decide(&self, reason: &str) -> Directive {
        match self {
            SupervisorStrategy::Fixed(d) => *d,
            SupervisorStrategy::ByReason(f) => f(reason),
        }
    }
}

impl From<Directive> for SupervisorStrategy {
    fn from(d: Directive) -> Self {
        SupervisorStrategy::Fixed(d)
    }
}

/// Guardian-level directive, parsed from the `--supervise`/`guardian_directive`
/// surface. Distinct from `Directive` because the Guardian never escalates —
/// there is nowhere further up the tree for it to go.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum GuardianDirective {
    Stop,
    Restart,
    Resume,
}

impl GuardianDirective {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "stop" => Some(GuardianDirective::Stop),
            "restart" => Some(GuardianDirective::Restart),
            "resume" => Some(GuardianDirective::Resume),
            _ => None,
        }
    }

    pub fn as_directive(self) -> Directive {
        match self {
            GuardianDirective::Stop => Directive::Stop,
            GuardianDirective::Restart => Directive::Restart,
            GuardianDirective::Resume => Directive::Resume,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_strategy_ignores_reason() {
        let s: SupervisorStrategy = Directive::Restart.into();
        assert_eq!(s.decide("anything"), Directive::Restart);
        assert_eq!(s.decide("boom"), Directive::Restart);
    }

    #[test]
    fn by_reason_strategy_dispatches() {
        let s = SupervisorStrategy::ByReason(std::sync::Arc::new(|reason: &str| {
            if reason == "boom" {
                Directive::Stop
            } else {
                Directive::Resume
            }
        }));
        assert_eq!(s.decide("boom"), Directive::Stop);
        assert_eq!(s.decide("oops"), Directive::Resume);
    }

    #[test]
    fn guardian_directive_parse() {
        assert_eq!(GuardianDirective::parse("stop"), Some(GuardianDirective::Stop));
        assert_eq!(GuardianDirective::parse("restart"), Some(GuardianDirective::Restart));
        assert_eq!(GuardianDirective::parse("resume"), Some(GuardianDirective::Resume));
        assert_eq!(GuardianDirective::parse("escalate"), None);
    }
}
