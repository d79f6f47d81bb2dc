//! Interactive menu
//!
//! The menu reads answers from any [`BufRead`] and writes prompts to any
//! [`Write`], so a whole session can be driven from memory in tests.
//! End of input leaves the menu as if `Exit` had been chosen.

use std::fmt;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use log::debug;

use crate::config::Settings;
use crate::convert::{ConversionOptions, default_output_path, prompt_yes_no, run_conversion};
use crate::errors::Result;
use crate::formats::{Format, Target, infer_format, menu_entries};
use crate::logging::{failure_line, notice_line, success_line};
use crate::tools::Tools;
use crate::translate::{Translator, default_translation_path, translate_file};

const BANNER: &str = "===== File Toolkit =====";

/// Counters printed when the session ends
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub conversions_attempted: usize,
    pub conversions_succeeded: usize,
    pub conversions_failed: usize,
    pub translations: usize,
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Session summary: {} conversions attempted, {} succeeded, {} failed, {} translations",
            self.conversions_attempted,
            self.conversions_succeeded,
            self.conversions_failed,
            self.translations
        )
    }
}

/// Why a prompt produced no answer
enum Flow {
    /// The reader is exhausted
    Eof,
}

type Answer = std::result::Result<String, Flow>;

/// A menu session over a reader and a writer
pub struct Menu<'a, R, W> {
    reader: R,
    writer: W,
    settings: &'a Settings,
    translator: &'a dyn Translator,
    stats: SessionStats,
}

impl<'a, R: BufRead, W: Write> Menu<'a, R, W> {
    pub fn new(
        reader: R,
        writer: W,
        settings: &'a Settings,
        translator: &'a dyn Translator,
    ) -> Menu<'a, R, W> {
        Menu {
            reader,
            writer,
            settings,
            translator,
            stats: SessionStats::default(),
        }
    }

    /// Run until the user exits or input ends
    ///
    /// # Errors
    /// Returns an error only when the writer or reader fails
    pub fn run(mut self) -> Result<SessionStats> {
        loop {
            writeln!(self.writer)?;
            writeln!(self.writer, "{BANNER}")?;
            writeln!(self.writer, "1. Convert File")?;
            writeln!(self.writer, "2. Translate File")?;
            writeln!(self.writer, "3. Exit")?;

            let choice = match self.ask("Choose an option: ")? {
                Ok(choice) => choice,
                Err(Flow::Eof) => break,
            };
            let keep_going = match choice.to_lowercase().as_str() {
                "1" => self.convert()?,
                "2" => self.translate()?,
                "3" | "exit" | "q" | "quit" => false,
                _ => {
                    writeln!(self.writer, "{}", failure_line("Invalid choice!"))?;
                    true
                }
            };
            if !keep_going {
                break;
            }
        }

        writeln!(self.writer)?;
        writeln!(self.writer, "{}", self.stats)?;
        writeln!(self.writer, "Goodbye!")?;
        self.writer.flush()?;
        Ok(self.stats)
    }

    /// Print `prompt` and read one trimmed line
    fn ask(&mut self, prompt: &str) -> Result<Answer> {
        write!(self.writer, "{prompt}")?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            return Ok(Err(Flow::Eof));
        }
        Ok(Ok(line.trim().to_string()))
    }

    /// Read a path, dropping the quotes a file manager adds on drag and drop
    fn ask_path(&mut self, prompt: &str) -> Result<std::result::Result<Option<PathBuf>, Flow>> {
        Ok(self.ask(prompt)?.map(|answer| {
            let unquoted = answer.trim_matches(|c| c == '"' || c == '\'').trim();
            (!unquoted.is_empty()).then(|| PathBuf::from(unquoted))
        }))
    }

    /// One conversion; returns `false` when input ended
    fn convert(&mut self) -> Result<bool> {
        let input = match self.ask_path("Enter input file path: ")? {
            Ok(Some(path)) if path.is_file() => path,
            Ok(_) => {
                writeln!(self.writer, "{}", failure_line("Input file not found."))?;
                return Ok(true);
            }
            Err(Flow::Eof) => return Ok(false),
        };

        let answer = match self.ask("Enter source format (blank for auto): ")? {
            Ok(answer) => answer,
            Err(Flow::Eof) => return Ok(false),
        };
        let source = if answer.is_empty() || answer.eq_ignore_ascii_case("auto") {
            match infer_format(&input) {
                Some(format) => format,
                None => {
                    let message = format!("Cannot detect the format of {}", input.display());
                    writeln!(self.writer, "{}", failure_line(&message))?;
                    return Ok(true);
                }
            }
        } else {
            match Format::from_str(&answer) {
                Ok(format) => format,
                Err(e) => {
                    writeln!(self.writer, "{}", failure_line(&e.to_string()))?;
                    return Ok(true);
                }
            }
        };
        debug!("Menu conversion from {source}");

        let entries = menu_entries(source);
        if entries.is_empty() {
            let message = format!("No conversions available for {}", source.label());
            writeln!(self.writer, "{}", failure_line(&message))?;
            return Ok(true);
        }
        writeln!(self.writer, "Select output format:")?;
        for entry in &entries {
            writeln!(self.writer, "  {}. {}", entry.key, entry.label)?;
        }
        let choice = match self.ask("Enter choice: ")? {
            Ok(choice) => choice,
            Err(Flow::Eof) => return Ok(false),
        };
        let Some(entry) = entries.iter().find(|entry| entry.key == choice) else {
            writeln!(self.writer, "{}", failure_line("Invalid choice!"))?;
            return Ok(true);
        };

        let output = match self.ask_path("Enter output path (blank for default): ")? {
            Ok(Some(path)) => path,
            Ok(None) => default_output_path(&input, entry.target),
            Err(Flow::Eof) => return Ok(false),
        };

        let mut options = ConversionOptions::from_settings(self.settings);
        self.ask_image_layout(source, entry.target, &mut options);

        self.stats.conversions_attempted += 1;
        match run_conversion(source, entry.target, &input, &output, &options) {
            Ok(result) => {
                self.stats.conversions_succeeded += 1;
                let message = format!("Converted successfully: {}", result.path.display());
                writeln!(self.writer, "{}", success_line(&message))?;
                for extra in &result.extras {
                    writeln!(self.writer, "Also wrote: {}", extra.display())?;
                }
                for note in &result.notes {
                    writeln!(self.writer, "{}", notice_line(note))?;
                }
            }
            Err(e) => {
                self.stats.conversions_failed += 1;
                let message = format!("Conversion failed: {e}");
                writeln!(self.writer, "{}", failure_line(&message))?;
            }
        }
        Ok(true)
    }

    /// Settle the split or merge choice of image output up front
    ///
    /// Converters would otherwise ask on the process stdin, which this menu
    /// may be holding.
    fn ask_image_layout(&mut self, source: Format, target: Target, options: &mut ConversionOptions) {
        if target != Target::Format(Format::Png) || source.is_image() {
            return;
        }
        match source {
            Format::Pdf | Format::Docx => {
                let merge = prompt_yes_no(
                    &mut self.reader,
                    &mut self.writer,
                    "Merge multi-page documents into one image?",
                    false,
                );
                options.merge_pages = Some(merge);
            }
            _ => {
                let split = prompt_yes_no(
                    &mut self.reader,
                    &mut self.writer,
                    "Split long output into multiple images?",
                    true,
                );
                options.split = Some(split);
            }
        }
    }

    /// One translation; returns `false` when input ended
    fn translate(&mut self) -> Result<bool> {
        let input = match self.ask_path("Enter input file path: ")? {
            Ok(Some(path)) if path.is_file() => path,
            Ok(_) => {
                writeln!(self.writer, "{}", failure_line("Input file not found."))?;
                return Ok(true);
            }
            Err(Flow::Eof) => return Ok(false),
        };

        let defaults = &self.settings.translate;
        let source_prompt = format!("Source language (default: {}): ", defaults.source);
        let target_prompt = format!("Target language (default: {}): ", defaults.target);
        let (default_source, default_target) = (defaults.source.clone(), defaults.target.clone());

        let source = match self.ask(&source_prompt)? {
            Ok(answer) if answer.is_empty() => default_source,
            Ok(answer) => answer,
            Err(Flow::Eof) => return Ok(false),
        };
        let target = match self.ask(&target_prompt)? {
            Ok(answer) if answer.is_empty() => default_target,
            Ok(answer) => answer,
            Err(Flow::Eof) => return Ok(false),
        };
        let output = match self.ask_path("Enter output path (blank for default): ")? {
            Ok(Some(path)) => path,
            Ok(None) => default_translation_path(&input),
            Err(Flow::Eof) => return Ok(false),
        };

        let tools = Tools::new(self.settings.tools.clone());
        match translate_file(
            self.translator,
            &input,
            &output,
            &source,
            &target,
            self.settings.translate.chunk_size,
            &tools,
        ) {
            Ok(_) => {
                self.stats.translations += 1;
                let message = format!("Translated successfully: {}", output.display());
                writeln!(self.writer, "{}", success_line(&message))?;
            }
            Err(e) => {
                let message = format!("Translation failed: {e}");
                writeln!(self.writer, "{}", failure_line(&message))?;
            }
        }
        Ok(true)
    }
}

/// Run a menu session over the given reader and writer
///
/// # Errors
/// Returns an error when the reader or writer fails
pub fn run_menu<R: BufRead, W: Write>(
    reader: R,
    writer: W,
    settings: &Settings,
    translator: &dyn Translator,
) -> Result<SessionStats> {
    Menu::new(reader, writer, settings, translator).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::tempdir;

    struct Echo;

    impl Translator for Echo {
        fn translate(&self, text: &str, source: &str, target: &str) -> Result<String> {
            Ok(format!("[{source}->{target}] {text}"))
        }
    }

    fn session(input: &str) -> (SessionStats, String) {
        let mut out = Vec::new();
        let settings = Settings::default();
        let stats = run_menu(Cursor::new(input.to_string()), &mut out, &settings, &Echo).unwrap();
        (stats, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_exit_prints_summary() {
        let (stats, out) = session("3\n");
        assert_eq!(stats, SessionStats::default());
        assert!(out.contains(BANNER));
        assert!(out.contains("Session summary: 0 conversions attempted"));
    }

    #[test]
    fn test_eof_exits_cleanly() {
        let (_, out) = session("");
        assert!(out.contains("Goodbye!"));
    }

    #[test]
    fn test_invalid_menu_option() {
        let (_, out) = session("9\n3\n");
        assert!(out.contains("❌ Invalid choice!"));
    }

    #[test]
    fn test_missing_input_returns_to_menu() {
        let (stats, out) = session("1\n/definitely/not/here.csv\n3\n");
        assert!(out.contains("❌ Input file not found."));
        assert_eq!(stats.conversions_attempted, 0);
        assert_eq!(out.matches(BANNER).count(), 2);
    }

    #[test]
    fn test_convert_csv_to_json_with_default_output() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("people.csv");
        std::fs::write(&input, "name,age\nAsha,30\n").unwrap();

        // CSV targets: pdf, txt, png, docx, xlsx, json
        let script = format!("1\n{}\n\n6\n\n3\n", input.display());
        let (stats, out) = session(&script);

        assert!(out.contains("6. CSV → JSON"), "{out}");
        assert!(out.contains("✅ Converted successfully"), "{out}");
        assert_eq!(stats.conversions_succeeded, 1);
        assert!(dir.path().join("people.json").exists());
    }

    #[test]
    fn test_invalid_target_choice() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("people.csv");
        std::fs::write(&input, "a,b\n").unwrap();

        let (stats, out) = session(&format!("1\n{}\ncsv\n42\n3\n", input.display()));
        assert!(out.contains("❌ Invalid choice!"));
        assert_eq!(stats.conversions_attempted, 0);
    }

    #[test]
    fn test_failed_conversion_is_counted() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("broken.json");
        std::fs::write(&input, "not json\nat all\n").unwrap();

        // JSON targets start with csv
        let (stats, out) = session(&format!("1\n{}\n\n1\n\n3\n", input.display()));
        assert!(out.contains("❌ Conversion failed"), "{out}");
        assert_eq!(stats.conversions_failed, 1);
        assert!(!dir.path().join("broken.csv").exists());
    }

    #[test]
    fn test_translate_uses_defaults() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("note.txt");
        std::fs::write(&input, "namaste").unwrap();

        let (stats, out) = session(&format!("2\n\"{}\"\n\n\n\n3\n", input.display()));
        assert!(out.contains("✅ Translated successfully"), "{out}");
        assert_eq!(stats.translations, 1);

        let written = std::fs::read_to_string(dir.path().join("note.translated.txt")).unwrap();
        assert_eq!(written, "[auto->en] namaste");
    }

    #[test]
    fn test_image_output_asks_split_on_the_menu_reader() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("long.csv");
        let rows: Vec<String> = (1..=81).map(|n| format!("{n},row {n}")).collect();
        std::fs::write(&input, format!("id,name\n{}\n", rows.join("\n"))).unwrap();

        // CSV target 3 is png; the split answer comes from the same input
        let (stats, out) = session(&format!("1\n{}\n\n3\n\nn\n3\n", input.display()));
        assert!(out.contains("Split long output into multiple images? [Y/n]"), "{out}");
        assert_eq!(stats.conversions_attempted, 1);
        assert!(out.contains("Goodbye!"));
        assert!(!dir.path().join("long.zip").exists());
    }

    #[test]
    fn test_document_output_asks_merge() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("scan.pdf");
        std::fs::write(&input, b"%PDF-1.4").unwrap();

        let (stats, out) = session(&format!("1\n{}\n\n3\n\ny\n3\n", input.display()));
        assert!(out.contains("Merge multi-page documents into one image? [y/N]"), "{out}");
        assert_eq!(stats.conversions_attempted, 1);
    }
}
