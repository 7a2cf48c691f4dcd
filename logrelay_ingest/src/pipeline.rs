use std::future::Future;
use std::mem;

use logrelay_core::{Error, Result};
use tokio::io::AsyncBufRead;
use tracing::{debug, error, info};

use crate::source::LineSource;

/// Default number of lines per batch.
pub const DEFAULT_BATCH_SIZE: usize = 20_000;

/// Consecutive input lines sent upstream as one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    ordinal: usize,
    first_line: usize,
    lines: Vec<String>,
}

impl Batch {
    /// 1-based position of this batch in the run.
    #[must_use]
    pub const fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// 1-based number of the first line in the input.
    #[must_use]
    pub const fn first_line(&self) -> usize {
        self.first_line
    }

    #[must_use]
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines joined with `\n`.
    #[must_use]
    pub fn to_prompt(&self) -> String {
        self.lines.join("\n")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub lines: usize,
    pub batches: usize,
}

/// Splits a line stream into batches and hands them to a processor, one at
/// a time, in input order.
#[derive(Debug, Clone, Copy)]
pub struct BatchPipeline {
    batch_size: usize,
}

impl BatchPipeline {
    pub fn new(batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::invalid_input("batch size must be at least 1"));
        }
        Ok(Self { batch_size })
    }

    #[must_use]
    pub const fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Drain `source`, calling `process` once per full batch and once for a
    /// trailing partial batch.
    ///
    /// The next line is not read until the previous batch has been processed.
    /// The first processing error stops the run; batches already processed
    /// are not undone.
    pub async fn run<R, F, Fut>(
        &self,
        source: &mut LineSource<R>,
        mut process: F,
    ) -> Result<IngestReport>
    where
        R: AsyncBufRead + Unpin,
        F: FnMut(Batch) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let mut report = IngestReport::default();
        let mut lines = Vec::new();
        let mut first_line = 1;

        while let Some(line) = source.next_line().await? {
            report.lines += 1;
            lines.push(line);

            if lines.len() >= self.batch_size {
                let batch = Batch {
                    ordinal: report.batches + 1,
                    first_line,
                    lines: mem::take(&mut lines),
                };
                first_line = report.lines + 1;
                Self::dispatch(batch, &mut process).await?;
                report.batches += 1;
            }
        }

        if !lines.is_empty() {
            let batch = Batch {
                ordinal: report.batches + 1,
                first_line,
                lines,
            };
            Self::dispatch(batch, &mut process).await?;
            report.batches += 1;
        }

        info!(
            "Finished processing {} lines in {} batches",
            report.lines, report.batches
        );
        Ok(report)
    }

    async fn dispatch<F, Fut>(batch: Batch, process: &mut F) -> Result<()>
    where
        F: FnMut(Batch) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let ordinal = batch.ordinal();
        debug!(
            "Processing batch {ordinal}: lines {}..{}",
            batch.first_line(),
            batch.first_line() + batch.len() - 1
        );
        process(batch).await.inspect_err(|e| {
            error!("Batch {ordinal} failed: {e}");
        })
    }
}
