//! Size comparison between a batch compiled with and without a lookup table

use std::fmt;

use crate::utils::transaction::CompiledTransaction;

/// How worthwhile the lookup table is for a batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SavingsRating {
    Minimal,
    Moderate,
    Good,
    Excellent,
}

impl SavingsRating {
    /// Rates a percentage size reduction
    pub fn from_percent(percent_reduction: f64) -> Self {
        if percent_reduction > 50.0 {
            Self::Excellent
        } else if percent_reduction > 30.0 {
            Self::Good
        } else if percent_reduction > 15.0 {
            Self::Moderate
        } else {
            Self::Minimal
        }
    }
}

impl fmt::Display for SavingsRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Excellent => "excellent",
            Self::Good => "good",
            Self::Moderate => "moderate",
            Self::Minimal => "minimal",
        };
        f.write_str(label)
    }
}

/// Sizes of the same batch compiled both ways
///
/// Savings are the plain difference of the two wire sizes; the lookup table
/// reference is already part of `with_table`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeComparison {
    /// Bytes without a lookup table
    pub without_table: usize,
    /// Bytes with the lookup table
    pub with_table: usize,
    pub instruction_count: usize,
    pub signer_count: usize,
    /// Addresses resolved through the table
    pub table_addresses: usize,
}

impl SizeComparison {
    pub fn new(without: &CompiledTransaction, with: &CompiledTransaction) -> Self {
        Self {
            without_table: without.size,
            with_table: with.size,
            instruction_count: with.instruction_count,
            signer_count: with.signer_count,
            table_addresses: with.lookup_address_count(),
        }
    }

    /// Bytes saved, negative when the table made the transaction larger
    pub fn byte_savings(&self) -> i64 {
        self.without_table as i64 - self.with_table as i64
    }

    pub fn percent_reduction(&self) -> f64 {
        if self.without_table == 0 {
            return 0.0;
        }
        self.byte_savings() as f64 / self.without_table as f64 * 100.0
    }

    pub fn compression_ratio(&self) -> f64 {
        if self.with_table == 0 {
            return 0.0;
        }
        self.without_table as f64 / self.with_table as f64
    }

    /// How much larger the plain transaction is, in percent of the compact one
    pub fn efficiency_gain(&self) -> f64 {
        if self.with_table == 0 {
            return 0.0;
        }
        (self.compression_ratio() - 1.0) * 100.0
    }

    pub fn bandwidth_saved_kb(&self) -> f64 {
        self.byte_savings() as f64 / 1024.0
    }

    pub fn rating(&self) -> SavingsRating {
        SavingsRating::from_percent(self.percent_reduction())
    }
}

impl fmt::Display for SizeComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Transaction sizes")?;
        writeln!(f, "  without lookup table: {} bytes", self.without_table)?;
        writeln!(f, "  with lookup table:    {} bytes", self.with_table)?;
        writeln!(f, "  saved:                {} bytes", self.byte_savings())?;
        writeln!(f, "Efficiency")?;
        writeln!(f, "  size reduction:       {:.2}%", self.percent_reduction())?;
        writeln!(f, "  efficiency gain:      {:.2}%", self.efficiency_gain())?;
        writeln!(f, "  compression ratio:    {:.2}:1", self.compression_ratio())?;
        writeln!(f, "  bandwidth saved:      {:.2} KB", self.bandwidth_saved_kb())?;
        writeln!(f, "Transaction")?;
        writeln!(f, "  instructions:         {}", self.instruction_count)?;
        writeln!(f, "  signers:              {}", self.signer_count)?;
        writeln!(f, "  table addresses:      {}", self.table_addresses)?;
        write!(
            f,
            "Rating: {} ({:.2}% reduction)",
            self.rating(),
            self.percent_reduction()
        )
    }
}
