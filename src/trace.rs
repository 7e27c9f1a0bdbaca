use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Scan,
    Parse,
    Exec,
}

impl Phase {
    pub fn name(self) -> &'static str {
        match self {
            Self::Scan => "scan",
            Self::Parse => "parse",
            Self::Exec => "exec",
        }
    }

    fn bit(self) -> u8 {
        1 << self as u8
    }

    fn from_name(name: &str) -> Option<Phase> {
        [Self::Scan, Self::Parse, Self::Exec]
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }
}

/// Bit set of the phases `PASTEL_TRACE` switched on.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Phases(u8);

impl Phases {
    /// `1` enables every phase; otherwise a comma list of phase names.
    /// Unknown names are ignored.
    fn parse(val: &str) -> Phases {
        match val.trim() {
            "1" => Phases(u8::MAX),
            list => Phases(
                list.split(',')
                    .filter_map(|name| Phase::from_name(name.trim()))
                    .fold(0, |bits, p| bits | p.bit()),
            ),
        }
    }

    fn contains(self, phase: Phase) -> bool {
        self.0 & phase.bit() != 0
    }
}

static PHASES: OnceLock<Phases> = OnceLock::new();

pub fn is_enabled(phase: Phase) -> bool {
    PHASES
        .get_or_init(|| Phases::parse(&std::env::var("PASTEL_TRACE").unwrap_or_default()))
        .contains(phase)
}

macro_rules! trace_log {
    ($phase:expr, $($arg:tt)*) => {
        if $crate::trace::is_enabled($phase) {
            eprintln!("[{}] {}", $phase.name(), format_args!($($arg)*));
        }
    };
}
pub(crate) use trace_log;
