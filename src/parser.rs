//! Splits an input line into pipeline stages.
//!
//! The grammar is deliberately flat: `stage ('|' stage)*`, where a stage is a
//! whitespace-separated list of words. There is no quoting, escaping or expansion,
//! so `|` always delimits stages.

use crate::error::ParseError;

/// Separator between pipeline stages.
pub const PIPE_DELIMITER: char = '|';

/// One command invocation within a pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Stage {
    index: usize,
    argv: Vec<String>,
}

impl Stage {
    /// Position of the stage in its pipeline, starting at 0.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Full argument vector, including the program name. Never empty.
    pub fn argv(&self) -> &[String] {
        &self.argv
    }

    pub fn program(&self) -> &str {
        &self.argv[0]
    }

    pub fn args(&self) -> &[String] {
        &self.argv[1..]
    }
}

/// An ordered chain of one or more stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn head(&self) -> &Stage {
        &self.stages[0]
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Number of pipes needed to connect the stages.
    pub fn connections(&self) -> usize {
        self.stages.len() - 1
    }
}

/// Parse one trimmed line into a [`Pipeline`].
///
/// Fails with [`ParseError::EmptyStage`] if any stage has no words, which covers
/// leading, trailing and doubled delimiters as well as an empty line.
pub fn parse_pipeline(line: &str) -> Result<Pipeline, ParseError> {
    let stages = line
        .split(PIPE_DELIMITER)
        .enumerate()
        .map(|(index, segment)| {
            let argv: Vec<String> = segment.split_whitespace().map(str::to_owned).collect();
            if argv.is_empty() {
                Err(ParseError::EmptyStage { position: index })
            } else {
                Ok(Stage { index, argv })
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Pipeline { stages })
}
