//! Interactive questions on the terminal, and canned answers for scripts
//! and tests.

use simctl_core::{Confirm, Prompt};
use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::Mutex;

/// Whether `answer` is an explicit yes. Only a bare `y` counts.
pub fn is_yes(answer: &str) -> bool {
    answer.trim_end_matches(['\r', '\n']) == "y"
}

/// Asks on stdout and reads one line from stdin.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinConsole;

impl StdinConsole {
    fn read_line(question: &str) -> Option<String> {
        read_answer(question, &mut io::stdout().lock(), &mut io::stdin().lock())
    }
}

/// Show `question` and read one line. A question that cannot be shown, an
/// unreadable input or end of input all count as no answer.
fn read_answer(
    question: &str,
    output: &mut impl Write,
    input: &mut impl BufRead,
) -> Option<String> {
    write!(output, "{question}").ok()?;
    output.flush().ok()?;

    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(line),
    }
}

impl Confirm for StdinConsole {
    fn confirm(&self, prompt: &str) -> bool {
        Self::read_line(prompt).is_some_and(|answer| is_yes(&answer))
    }
}

impl Prompt for StdinConsole {
    fn ask(&self, question: &str) -> Option<String> {
        let answer = Self::read_line(question)?;
        let answer = answer.trim();
        (!answer.is_empty()).then(|| answer.to_string())
    }
}

/// Gives the same answer to every confirmation and records the prompts.
#[derive(Debug, Default)]
pub struct CannedConfirm {
    answer: String,
    prompts: Mutex<Vec<String>>,
}

impl CannedConfirm {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Always answers `y`.
    pub fn yes() -> Self {
        Self::new("y")
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|prompts| prompts.clone())
            .unwrap_or_default()
    }
}

impl Confirm for CannedConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        if let Ok(mut prompts) = self.prompts.lock() {
            prompts.push(prompt.to_string());
        }
        is_yes(&self.answer)
    }
}

/// Answers free-text questions from a queue. An empty queue means no answer.
#[derive(Debug, Default)]
pub struct CannedPrompt {
    answers: Mutex<VecDeque<Option<String>>>,
    questions: Mutex<Vec<String>>,
}

impl CannedPrompt {
    pub fn new<I, S>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            answers: Mutex::new(answers.into_iter().map(|a| a.map(Into::into)).collect()),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn questions(&self) -> Vec<String> {
        self.questions
            .lock()
            .map(|questions| questions.clone())
            .unwrap_or_default()
    }
}

impl Prompt for CannedPrompt {
    fn ask(&self, question: &str) -> Option<String> {
        if let Ok(mut questions) = self.questions.lock() {
            questions.push(question.to_string());
        }
        self.answers
            .lock()
            .ok()
            .and_then(|mut answers| answers.pop_front())
            .flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn test_read_answer() {
        let mut shown = Vec::new();
        let answer = read_answer("Continue? (y/n): ", &mut shown, &mut &b"y\n"[..]);
        assert_eq!(answer.as_deref(), Some("y\n"));
        assert_eq!(shown, b"Continue? (y/n): ");

        assert_eq!(read_answer("Name: ", &mut Vec::new(), &mut &b""[..]), None);
    }

    #[test]
    fn test_unshown_question_has_no_answer() {
        assert_eq!(read_answer("Continue? (y/n): ", &mut BrokenPipe, &mut &b"y\n"[..]), None);
    }

    #[test]
    fn test_only_bare_y_confirms() {
        assert!(is_yes("y"));
        assert!(is_yes("y\n"));
        assert!(is_yes("y\r\n"));
        for answer in ["", "Y", "yes", "n", " y", "yy"] {
            assert!(!is_yes(answer), "{answer:?}");
        }
    }

    #[test]
    fn test_canned_prompt_runs_dry() {
        let prompt = CannedPrompt::new([Some("first"), None]);
        assert_eq!(prompt.ask("a?").as_deref(), Some("first"));
        assert_eq!(prompt.ask("b?"), None);
        assert_eq!(prompt.ask("c?"), None);
        assert_eq!(prompt.questions(), vec!["a?", "b?", "c?"]);
    }
}
