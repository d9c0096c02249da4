//! Terminal output helpers: styled text for humans, using `console` for
//! formatting (structured JSON output is left for a later pass; this module
//! is human-facing only, unlike a dual-mode `output` module).

use console::style;
use pilotcore_core::{ContentBlock, SessionEvent};

pub fn header(text: &str) {
    println!("{}", style(text).bold().cyan());
}

pub fn kv(key: &str, value: &str) {
    println!("  {} {}", style(key).cyan().bold(), value);
}

pub fn success(text: &str) {
    println!("{} {}", style("✓").green(), style(text).bright());
}

pub fn error(text: &str) {
    eprintln!("{} {}", style("✗").red(), style(text).bright());
}

pub fn dim(text: &str) {
    println!("{}", style(text).dim());
}

/// Renders one `SessionEvent` as it streams off the Agent Loop.
pub fn event(event: &SessionEvent) {
    match event {
        SessionEvent::PersistentMessage { message } => {
            let role = format!("{:?}", message.role).to_lowercase();
            for block in &message.blocks {
                match block {
                    ContentBlock::Text { text } => println!("{} {}", style(format!("[{role}]")).blue(), text),
                    ContentBlock::Thought { text } => println!("{} {}", style("[thought]").magenta(), style(text).dim()),
                    ContentBlock::FunctionCall { call } => {
                        println!("{} {}({})", style("[call]").yellow(), call.name, call.args)
                    }
                    ContentBlock::FunctionResponse { name, response, .. } => {
                        println!("{} {name} -> {:?}", style("[result]").green(), response)
                    }
                    ContentBlock::Image { reference } => {
                        println!("{} {}", style("[image]").dim(), reference.to_uri())
                    }
                }
            }
            if let Some(review) = &message.review {
                println!("{} {}", style("[review]").red(), review.review_id());
            }
        }
        SessionEvent::StreamMessage { text, thought, .. } => {
            if let Some(t) = thought {
                print!("{}", style(t).dim());
            }
            if let Some(t) = text {
                print!("{t}");
            }
        }
        SessionEvent::SessionStatus { status, message } => {
            let label = format!("{status:?}").to_lowercase();
            match message {
                Some(m) => println!("\n{} {label}: {m}", style("[status]").cyan()),
                None => println!("\n{} {label}", style("[status]").cyan()),
            }
        }
    }
}
