use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown {field} value: '{value}'")]
pub struct UnknownVariant {
    pub field: String,
    pub value: String,
}

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }

            pub fn all() -> &'static [$name] {
                &[$(Self::$variant),+]
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(UnknownVariant {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

str_enum!(ProgramKind {
    SingleSession => "single_session",
    MultiWeekPlan => "multi_week_plan",
});

// Canonical equipment names as stored on exercise entries.
str_enum!(Equipment {
    HaxBarbell => "Hax Barbell",
    Barbell => "Barbell",
    Dumbbell => "Dumbbell",
    Cable => "Cable",
    Machine => "Machine",
    Kettlebell => "Kettlebell",
    ResistanceBand => "Resistance Band",
    Bodyweight => "Bodyweight",
});

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn program_kind_round_trip() {
        for kind in ProgramKind::all() {
            assert_eq!(ProgramKind::from_str(kind.as_str()).unwrap(), *kind);
        }
    }

    #[test]
    fn equipment_parses_canonical_names() {
        assert_eq!(Equipment::from_str("Resistance Band").unwrap(), Equipment::ResistanceBand);
        assert_eq!(Equipment::from_str("Hax Barbell").unwrap(), Equipment::HaxBarbell);
    }

    #[test]
    fn unknown_value_is_rejected() {
        let err = ProgramKind::from_str("weekly_plan").unwrap_err();
        assert_eq!(err.field, "ProgramKind");
        assert_eq!(err.value, "weekly_plan");
        assert_eq!(err.to_string(), "Unknown ProgramKind value: 'weekly_plan'");
    }

    #[test]
    fn display_uses_wire_name() {
        assert_eq!(ProgramKind::MultiWeekPlan.to_string(), "multi_week_plan");
        assert_eq!(Equipment::Kettlebell.to_string(), "Kettlebell");
    }
}
