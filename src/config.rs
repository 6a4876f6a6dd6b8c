use std::env;
use std::io::{self, Write};

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal,
};

/// Trait for clients that can pick up their API key from the environment.
pub trait KeyFromEnv {
    /// The environment variable name for this client's API key
    const KEY_NAME: &'static str;

    /// Look for the key in the environment, loading `.env` first if present.
    fn find_key() -> Option<String> {
        let _ = dotenvy::dotenv();
        env::var(Self::KEY_NAME).ok().filter(|k| !k.trim().is_empty())
    }

    /// Ask for the key with masked input. An empty answer falls back to
    /// `find_key`, and failing that returns an empty string so the caller's
    /// credential check can report it.
    fn find_key_with_user(label: &str) -> io::Result<String> {
        let found = Self::find_key();
        let hint = if found.is_some() {
            format!(" [Enter to use {} from environment]", Self::KEY_NAME)
        } else {
            String::new()
        };
        let typed = read_masked(&format!("{}{}: ", label, hint))?;
        if typed.is_empty() {
            return Ok(found.unwrap_or_default());
        }
        Ok(typed)
    }
}

/// Read a line from the terminal echoing `*` for each character.
pub fn read_masked(prompt: &str) -> io::Result<String> {
    print!("{}", prompt);
    io::stdout().flush()?;

    terminal::enable_raw_mode()?;
    let result = read_masked_raw();
    terminal::disable_raw_mode()?;
    println!();

    result
}

fn read_masked_raw() -> io::Result<String> {
    let mut input = String::new();
    loop {
        let Event::Key(KeyEvent { code, modifiers, kind, .. }) = event::read()? else {
            continue;
        };
        if kind == KeyEventKind::Release {
            continue;
        }
        match code {
            KeyCode::Enter => break,
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "input cancelled"));
            }
            KeyCode::Char(c) => {
                input.push(c);
                print!("*");
                io::stdout().flush()?;
            }
            KeyCode::Backspace => {
                if input.pop().is_some() {
                    print!("\u{8} \u{8}");
                    io::stdout().flush()?;
                }
            }
            _ => {}
        }
    }
    Ok(input.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Missing;
    impl KeyFromEnv for Missing {
        const KEY_NAME: &'static str = "MCQ_FORGE_TEST_KEY_THAT_IS_NEVER_SET";
    }

    #[test]
    fn unset_key_is_not_found() {
        assert_eq!(Missing::find_key(), None);
    }
}
