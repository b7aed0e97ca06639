//! Line-oriented review prompts

use super::{DecisionSurface, ReviewAction, ReviewPrompt, SurfaceError};
use std::io::{self, BufRead, BufReader, Stdin, Stdout, Write};

/// Asks about each item on a text stream and reads one answer per line
///
/// Commands: a candidate number, `s` skip, `a` auto-confirm the rest,
/// `b` back, `c`/`q` cancel the rest. End of input is an error, so the
/// coordinator cancels whatever is left.
pub struct TextPromptSurface<R, W> {
    input: R,
    output: W,
}

impl TextPromptSurface<BufReader<Stdin>, Stdout> {
    /// Prompt on the process's stdin/stdout
    pub fn stdio() -> Self {
        Self::new(BufReader::new(io::stdin()), io::stdout())
    }
}

impl<R: BufRead, W: Write> TextPromptSurface<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Consume the surface and hand back the output stream
    pub fn into_output(self) -> W {
        self.output
    }

    fn show(&mut self, prompt: &ReviewPrompt<'_>) -> io::Result<()> {
        let item = prompt.item;
        writeln!(self.output)?;
        writeln!(self.output, "--- Item {}/{} ---", prompt.position + 1, prompt.total)?;
        writeln!(self.output, "Card: {}", item.key.name)?;
        if !item.key.name_suffix.is_empty() {
            writeln!(self.output, "Annotations: {}", item.key.name_suffix)?;
        }
        writeln!(
            self.output,
            "Set: {} | Number: {} | Condition: {} | Rows: {}",
            item.key.set_name,
            item.key.collector_number.as_deref().unwrap_or("?"),
            item.key.condition,
            item.waiting_rows
        )?;

        for (idx, candidate) in item.candidates.iter().enumerate() {
            let marker = match prompt.previous.and_then(|d| d.selection()) {
                Some(selected) if selected == idx => '*',
                _ => ' ',
            };
            let origin = if candidate.synthesized { " [authority]" } else { "" };
            writeln!(
                self.output,
                "{}{:2}: {} | {} | #{} | Score: {}{}",
                marker,
                idx + 1,
                candidate.product_name,
                candidate.set_name,
                candidate.number,
                candidate.score,
                origin
            )?;
        }
        Ok(())
    }

    fn ask(&mut self, candidates: usize) -> Result<Option<ReviewAction>, SurfaceError> {
        write!(
            self.output,
            "Select [1-{}], [s]kip, [a]uto-all, [b]ack, [c]ancel: ",
            candidates
        )?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(SurfaceError::InputClosed);
        }

        Ok(parse_answer(line.trim(), candidates))
    }
}

/// Interpret one line of operator input
fn parse_answer(answer: &str, candidates: usize) -> Option<ReviewAction> {
    match answer.to_lowercase().as_str() {
        "s" => Some(ReviewAction::Skip),
        "a" => Some(ReviewAction::AutoConfirmRemaining),
        "b" => Some(ReviewAction::Back),
        "c" | "q" => Some(ReviewAction::CancelRemaining),
        other => match other.parse::<usize>() {
            Ok(n) if n >= 1 && n <= candidates => Some(ReviewAction::Confirm(n - 1)),
            _ => None,
        },
    }
}

impl<R, W> DecisionSurface for TextPromptSurface<R, W>
where
    R: BufRead + Send,
    W: Write + Send,
{
    fn name(&self) -> &'static str {
        "text"
    }

    fn open(&mut self, total: usize) -> Result<(), SurfaceError> {
        writeln!(self.output, "\n{} items need confirmation.", total)?;
        writeln!(
            self.output,
            "Commands: [number] select, [s] skip, [a] auto-confirm rest, [b] back, [c] cancel rest"
        )?;
        Ok(())
    }

    fn prompt(&mut self, prompt: &ReviewPrompt<'_>) -> Result<ReviewAction, SurfaceError> {
        self.show(prompt)?;
        loop {
            match self.ask(prompt.item.candidates.len())? {
                Some(action) => return Ok(action),
                None => writeln!(self.output, "Invalid choice. Try again.")?,
            }
        }
    }

    fn close(&mut self) {
        let _ = self.output.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NormalizedKey;
    use crate::services::review::{CandidateView, Decision, ReviewItem};
    use std::io::Cursor;

    fn item() -> ReviewItem {
        ReviewItem {
            key: NormalizedKey {
                name: "lightning bolt".to_string(),
                set_name: "double masters".to_string(),
                collector_number: None,
                condition: "near mint".to_string(),
                name_suffix: "(showcase)".to_string(),
            },
            candidates: vec![
                CandidateView {
                    product_name: "Lightning Bolt".to_string(),
                    set_name: "Double Masters".to_string(),
                    number: "117".to_string(),
                    condition: "Near Mint".to_string(),
                    score: 240,
                    synthesized: false,
                },
                CandidateView {
                    product_name: "Lightning Bolt (Showcase)".to_string(),
                    set_name: "Double Masters".to_string(),
                    number: "300".to_string(),
                    condition: "Near Mint".to_string(),
                    score: 230,
                    synthesized: true,
                },
            ],
            waiting_rows: 2,
        }
    }

    fn run(input: &str, previous: Option<Decision>) -> (Result<ReviewAction, SurfaceError>, String) {
        let item = item();
        let mut surface = TextPromptSurface::new(Cursor::new(input.as_bytes().to_vec()), Vec::new());
        let prompt = ReviewPrompt {
            item: &item,
            position: 0,
            total: 3,
            previous,
        };
        let action = surface.prompt(&prompt);
        let output = String::from_utf8(surface.into_output()).unwrap();
        (action, output)
    }

    #[test]
    fn test_number_selects_candidate() {
        let (action, output) = run("2\n", None);
        assert_eq!(action.unwrap(), ReviewAction::Confirm(1));
        assert!(output.contains("--- Item 1/3 ---"));
        assert!(output.contains("Annotations: (showcase)"));
        assert!(output.contains("[authority]"));
    }

    #[test]
    fn test_invalid_input_reprompts() {
        let (action, output) = run("9\nx\ns\n", None);
        assert_eq!(action.unwrap(), ReviewAction::Skip);
        assert_eq!(output.matches("Invalid choice").count(), 2);
    }

    #[test]
    fn test_commands() {
        assert_eq!(run("a\n", None).0.unwrap(), ReviewAction::AutoConfirmRemaining);
        assert_eq!(run("B\n", None).0.unwrap(), ReviewAction::Back);
        assert_eq!(run("q\n", None).0.unwrap(), ReviewAction::CancelRemaining);
    }

    #[test]
    fn test_end_of_input_is_error() {
        let (action, _) = run("", None);
        assert!(matches!(action, Err(SurfaceError::InputClosed)));
    }

    #[test]
    fn test_previous_selection_marked() {
        let (_, output) = run("1\n", Some(Decision::Confirmed(1)));
        assert!(output.contains("* 2: Lightning Bolt (Showcase)"));
    }
}
