//! Conversion of LTL formulas into automaton text by an external tool.

use std::ffi::OsString;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};
use std::string::FromUtf8Error;

use thiserror::Error;
use tracing::{debug, warn};

use crate::formula::LtlFormula;

#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("Could not start converter \"{program}\": {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Converter exited with status {code:?}: {stderr}")]
    Failed { code: Option<i32>, stderr: String },

    #[error("Converter reported an error: {0}")]
    Stderr(String),

    #[error("Converter produced no output")]
    EmptyOutput,

    #[error("Converter output is not valid UTF-8: {0}")]
    Encoding(#[from] FromUtf8Error),
}

/// Turns a formula into the automaton text consumed by [`crate::parser::parse_automaton`].
pub trait AutomatonConverter {
    fn convert(&self, formula: &LtlFormula) -> Result<String, ConversionError>;
}

impl<F> AutomatonConverter for F
where
    F: Fn(&LtlFormula) -> Result<String, ConversionError>,
{
    fn convert(&self, formula: &LtlFormula) -> Result<String, ConversionError> {
        self(formula)
    }
}

/// Runs a converter program, passing the printed formula as its last argument.
///
/// The call blocks until the program exits. Anything written to stderr is treated as a failure,
/// even when the exit status is zero.
#[derive(Clone, Debug)]
pub struct ProcessConverter {
    program: OsString,
    args: Vec<OsString>,
}

impl ProcessConverter {
    pub fn new<P, I, A>(program: P, args: I) -> Self
    where
        P: Into<OsString>,
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Invocation of the Rabinizer jar producing transition-based Rabin automata in HOA format.
    pub fn rabinizer<J: AsRef<Path>>(jar: J) -> Self {
        let mut args = vec![OsString::from("-jar"), jar.as_ref().as_os_str().to_owned()];
        args.extend(["-format=hoa", "-auto=tr", "-silent", "-out=std"].map(OsString::from));

        Self {
            program: OsString::from("java"),
            args,
        }
    }

    pub fn program(&self) -> &OsString {
        &self.program
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }
}

impl AutomatonConverter for ProcessConverter {
    fn convert(&self, formula: &LtlFormula) -> Result<String, ConversionError> {
        let program = self.program.to_string_lossy().into_owned();
        debug!(%program, %formula, "Running automaton converter");

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(formula.to_string())
            .stdin(Stdio::null())
            .output()
            .map_err(|source| ConversionError::Spawn { program, source })?;

        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        if !output.status.success() {
            return Err(ConversionError::Failed {
                code: output.status.code(),
                stderr,
            });
        }

        if !stderr.is_empty() {
            warn!(%stderr, "Automaton converter wrote to stderr");
            return Err(ConversionError::Stderr(stderr));
        }

        let stdout = String::from_utf8(output.stdout)?;

        if stdout.trim().is_empty() {
            return Err(ConversionError::EmptyOutput);
        }

        Ok(stdout)
    }
}
