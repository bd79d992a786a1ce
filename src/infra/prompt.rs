use std::io::{self, BufRead, BufReader, Stdin, Stderr, Write};
use std::sync::Mutex;
use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::warn;

use crate::app::ports::{HostField, MissingValuePort};

/// Asks for missing values on a terminal. Blank answers and end of input leave the
/// value unknown.
pub struct PromptValues<R, W> {
    input: Mutex<R>,
    output: Mutex<W>,
}

pub type StdinPrompt = PromptValues<BufReader<Stdin>, Stderr>;

impl StdinPrompt {
    pub fn stdio() -> Self {
        PromptValues::new(BufReader::new(io::stdin()), io::stderr())
    }
}

impl<R: BufRead, W: Write> PromptValues<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self {
            input: Mutex::new(input),
            output: Mutex::new(output),
        }
    }

    fn ask(&self, question: &str) -> Option<String> {
        if let Ok(mut out) = self.output.lock() {
            let _ = write!(out, "{}", question);
            let _ = out.flush();
        }

        let mut line = String::new();
        let read = match self.input.lock() {
            Ok(mut input) => blocking(|| input.read_line(&mut line)),
            Err(_) => return None,
        };
        match read {
            Ok(0) => None,
            Ok(_) => Some(line.trim().to_string()).filter(|answer| !answer.is_empty()),
            Err(e) => {
                warn!("Could not read answer: {}", e);
                None
            }
        }
    }
}

/// Runs a blocking terminal read. On a multi-threaded runtime the worker hands its other
/// tasks off first; the add run is sequential, so nothing else waits on the answer.
fn blocking<T>(read: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(read)
        }
        _ => read(),
    }
}

impl<R, W> MissingValuePort for PromptValues<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn provide(&self, star: &str, field: HostField) -> Option<String> {
        self.ask(&format!("{} - {}: ", star, field))
    }

    fn confirm(&self, star: &str) -> bool {
        loop {
            match self.ask(&format!("Add {}? Continue? [Y/N] ", star)) {
                Some(answer) if answer.eq_ignore_ascii_case("y") => return true,
                Some(answer) if answer.eq_ignore_ascii_case("n") => return false,
                Some(_) => continue,
                None => return false,
            }
        }
    }
}

/// Unattended runs: nothing is supplied and every star goes ahead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

impl MissingValuePort for NonInteractive {
    fn provide(&self, _star: &str, _field: HostField) -> Option<String> {
        None
    }

    fn confirm(&self, _star: &str) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt(input: &str) -> PromptValues<Cursor<Vec<u8>>, Vec<u8>> {
        PromptValues::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_answers_are_trimmed_and_blank_is_none() {
        let p = prompt(" 4.44 \n\n");
        assert_eq!(p.provide("HD 1", HostField::Logg).as_deref(), Some("4.44"));
        assert_eq!(p.provide("HD 1", HostField::LoggError), None);
        assert_eq!(p.provide("HD 1", HostField::Author), None);

        let asked = String::from_utf8(p.output.lock().unwrap().clone()).unwrap();
        assert!(asked.contains("HD 1 - logg: "));
        assert!(asked.contains("error on logg"));
    }

    #[test]
    fn test_confirm_repeats_until_yes_or_no() {
        let p = prompt("maybe\ny\nN\n");
        assert!(p.confirm("HD 1"));
        assert!(!p.confirm("HD 2"));
        assert!(!p.confirm("HD 3"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_prompt_reads_inside_multi_thread_runtime() {
        let p = prompt("y\n0.12\n");
        assert!(p.confirm("HD 1"));
        assert_eq!(p.provide("HD 1", HostField::FeH).as_deref(), Some("0.12"));
    }

    #[tokio::test]
    async fn test_prompt_reads_inside_current_thread_runtime() {
        let p = prompt("n\n");
        assert!(!p.confirm("HD 1"));
    }

    #[test]
    fn test_non_interactive() {
        assert_eq!(NonInteractive.provide("HD 1", HostField::Teff), None);
        assert!(NonInteractive.confirm("HD 1"));
    }
}
