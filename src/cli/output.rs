//! Output formatting and progress spinners for CLI

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    env::{GridEnvironment, StateSpace},
    policy::Policy,
};

/// Create a spinner for planning tasks
pub fn create_spinner(message: &str) -> Result<ProgressBar> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(message.to_string());
    Ok(pb)
}

/// Print a section header
pub fn print_section(title: &str) {
    println!("\n{}", "=".repeat(60));
    println!("{title}");
    println!("{}", "=".repeat(60));
}

/// Print a subsection header
pub fn print_subsection(title: &str) {
    println!("\n{title}");
    println!("{}", "-".repeat(40));
}

/// Format a number with thousands separators
pub fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, c) in s.chars().rev().enumerate() {
        if i > 0 && i.is_multiple_of(3) {
            result.insert(0, ',');
        }
        result.insert(0, c);
    }
    result
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:20} {}", format!("{}:", key), value);
}

/// Print a rate as `count (xx.x%)`
pub fn format_rate(count: usize, total: usize) -> String {
    let rate = if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    };
    format!("{} ({:.1}%)", format_number(count), rate * 100.0)
}

/// Print the arrow map of every flag layer, then the grid itself
pub fn print_policy_map(env: &GridEnvironment, policy: &Policy) {
    let space: &StateSpace = env.state_space();
    for layer in 0..space.flag_combinations() {
        if space.flag_combinations() > 1 {
            print_subsection(&format!("Policy (flags {layer:03b})"));
        } else {
            print_subsection("Policy");
        }
        print!("{}", policy.render(space, layer));
    }
    print_subsection("Layout");
    print!("{}", env.layout().grid);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(7), "7");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_format_rate() {
        assert_eq!(format_rate(1, 4), "1 (25.0%)");
        assert_eq!(format_rate(0, 0), "0 (0.0%)");
    }
}
