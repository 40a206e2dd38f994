//! User-facing report formatting.

use alphapack_core::{ChannelMessage, Rarity};
use alphapack_db::UserCount;

/// Tier order used in count summaries.
const REPORT_ORDER: [Rarity; 6] = [
    Rarity::Common,
    Rarity::Uncommon,
    Rarity::Rare,
    Rarity::Epic,
    Rarity::Legendary,
    Rarity::Unknown,
];

/// Summary sent back after a count run: total plus per-tier count and share.
pub fn format_count_reply(count: &UserCount) -> String {
    let total = count.total();
    let mut lines = Vec::with_capacity(REPORT_ORDER.len() + 2);
    lines.push(format!("<@{}>", count.author_id));
    lines.push(format!("Total: {}", total));
    for rarity in REPORT_ORDER {
        let n = count.count(rarity);
        let share = if total == 0 {
            0.0
        } else {
            (n as f64 / total as f64) * 100.0
        };
        lines.push(format!("{}: {} ({:.1}%)", rarity, n, share));
    }
    lines.join("\n")
}

/// Reply for a found first/last occurrence.
pub fn format_occurrence_reply(kind: &str, rarity: Rarity, hit: &ChannelMessage) -> String {
    format!(
        "You opened your {} {} on {}\nlink: {}",
        kind,
        rarity,
        hit.created_at.format("%d.%m.%Y at %H:%M"),
        hit.jump_url()
    )
}

/// Reply when the requested tier never occurred for that user.
pub fn format_never_occurred(kind: &str, rarity: Rarity) -> String {
    format!("No {} {} found, it never occurred.", kind, rarity)
}

/// Reply for the status command.
pub fn format_status(in_flight: usize, enabled: bool) -> String {
    format!(
        "In-flight tasks: {}\nBot enabled: {}",
        in_flight,
        if enabled { "yes" } else { "no" }
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn count_reply_includes_every_tier_and_total() {
        let mut count = UserCount::new(42, 7);
        count.increment(Rarity::Common);
        count.increment(Rarity::Common);
        count.increment(Rarity::Epic);
        count.increment(Rarity::Unknown);

        let reply = format_count_reply(&count);
        assert!(reply.starts_with("<@42>\nTotal: 4"));
        assert!(reply.contains("Common: 2 (50.0%)"));
        assert!(reply.contains("Epic: 1 (25.0%)"));
        assert!(reply.contains("Legendary: 0 (0.0%)"));
        assert!(reply.contains("Unknown: 1 (25.0%)"));
    }

    #[test]
    fn empty_count_reply_has_no_nan() {
        let count = UserCount::new(1, 1);
        let reply = format_count_reply(&count);
        assert!(reply.contains("Total: 0"));
        assert!(!reply.contains("NaN"));
    }
}
