use colored::Colorize;
use declarative::{Condition, ConditionStatus, Outcome};

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Marker for a pass outcome
pub fn outcome_symbol(outcome: &Outcome) -> &'static str {
    match outcome {
        Outcome::UpToDate { .. } => "○",
        Outcome::Planned(_) => "→",
        _ => "✓",
    }
}

/// One-line rendering of a condition
pub fn condition_line(condition: &Condition) -> String {
    let status = match condition.status {
        ConditionStatus::True => "True".green(),
        ConditionStatus::False => "False".red(),
        ConditionStatus::Unknown => "Unknown".yellow(),
    };
    let mut line = format!(
        "{:?}={} {:?} ({})",
        condition.kind,
        status,
        condition.reason,
        condition.last_transition_time.format("%Y-%m-%d %H:%M:%S UTC")
    );
    if let Some(message) = &condition.message {
        line.push_str(&format!(": {message}"));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use declarative::Action;

    #[test]
    fn test_outcome_symbol() {
        assert_eq!(
            outcome_symbol(&Outcome::UpToDate {
                late_initialized: true
            }),
            "○"
        );
        assert_eq!(outcome_symbol(&Outcome::Planned(Action::Create)), "→");
        assert_eq!(outcome_symbol(&Outcome::Updated), "✓");
    }

    #[test]
    fn test_condition_line() {
        colored::control::set_override(false);
        let line = condition_line(&Condition::available());
        assert!(line.starts_with("Ready=True Available"));
    }
}
