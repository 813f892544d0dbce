use log::{error, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("header doesn't contain allele name pattern: {header}")]
    HeaderPatternMismatch { header: String },
    #[error("allele name doesn't match standard pattern: {name}")]
    NonStandardAlleleName { name: String },
    #[error("duplicate records for allele {allele}")]
    DuplicateAllele { allele: String },
    #[error("no reference allele for gene {gene}")]
    NoReferenceAllele { gene: String },
    #[error("several reference alleles for gene {gene}")]
    MultipleReferenceAlleles { gene: String },
    #[error("skipping {allele} because its sequence contains wildcards")]
    WildcardSequenceSkipped { allele: String },
    #[error("{detail} in functional allele {allele}")]
    ConservedResidueViolation { allele: String, detail: String },
    #[error("reference points of {allele} are not in increasing order: {positions}")]
    UnorderedReferencePoints { allele: String, positions: String },
    #[error("allele {allele} shares no reference points with reference allele {reference}")]
    NoSharedReferencePoints { allele: String, reference: String },
    #[error("invalid builder parameters: {0}")]
    InvalidParameters(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// 只产生警告、从不中止构建的错误类型
    pub fn is_warning_only(&self) -> bool {
        matches!(
            self,
            BuildError::WildcardSequenceSkipped { .. } | BuildError::ConservedResidueViolation { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.severity {
            Severity::Warning => write!(f, "Warning: {}", self.message),
            Severity::Error => write!(f, "Error: {}", self.message),
        }
    }
}

/// 本次运行的警告与降级错误记录，每条同时写入 `log`
#[derive(Debug, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{}", message);
        self.entries.push(Diagnostic { severity: Severity::Warning, message });
    }

    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        error!("{}", message);
        self.entries.push(Diagnostic { severity: Severity::Error, message });
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.entries.iter().filter(|d| d.severity == severity).count()
    }

    pub fn write_to<W: std::io::Write>(&self, out: &mut W) -> std::io::Result<()> {
        for d in &self.entries {
            writeln!(out, "{}", d)?;
        }
        Ok(())
    }
}

/// 决定错误是中止构建还是降级为日志记录
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorPolicy {
    pub exception_on_error: bool,
}

impl ErrorPolicy {
    /// 需要中止构建时返回 `Err`；否则记录下来，由调用方跳过出错的记录或基因
    pub fn handle(&self, err: BuildError, diagnostics: &mut Diagnostics) -> Result<(), BuildError> {
        if err.is_warning_only() {
            diagnostics.warning(err.to_string());
            return Ok(());
        }
        if self.exception_on_error {
            return Err(err);
        }
        diagnostics.error(err.to_string());
        Ok(())
    }
}
