use crate::intent::{Classification, Gate, IntentTag};
use colored::*;

pub fn print_header(text: &str) {
    println!("\n{}", text.bright_cyan().bold());
    println!("{}", "=".repeat(text.chars().count()).bright_cyan());
}

pub fn print_success(text: &str) {
    println!("{}", text.green());
}

pub fn print_error(text: &str) {
    eprintln!("{}", text.red().bold());
}

pub fn print_info(text: &str) {
    println!("{}", text.blue());
}

/// One line per gate, fired gates first, then the matched tags.
pub fn print_classification(classification: &Classification) {
    for gate in Gate::ALL {
        let mark = if classification.gate_fired(gate) {
            "✓".green()
        } else {
            "·".dimmed()
        };
        println!("{} {}", mark, gate.as_str());
    }

    if classification.is_empty() {
        print_info("No intent tags matched (dashboard fallback)");
        return;
    }
    let tags: Vec<&str> = classification.tags.iter().map(|t: &IntentTag| t.as_str()).collect();
    println!("{} {}", "tags:".bold(), tags.join(", ").yellow());
}
