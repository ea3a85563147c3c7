//! Command handlers -- one module per subcommand

pub mod config;
pub mod list;
pub mod run;

use satprobe_harness::Tier;
use satprobe_harness::runner::Selection;

/// `--filter` / `--tier` 인자를 시나리오 선택 조건으로 바꿉니다.
pub(crate) fn selection(filter: Option<String>, tier: Option<u8>) -> Selection {
    Selection {
        filter,
        tier: tier.and_then(Tier::from_level),
    }
}
