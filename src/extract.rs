//! Extraction of called prophage sequences to FASTA.

use std::io::{self, Write};
use std::path::Path;

use noodles::fasta;
use noodles::fasta::record::{Definition, Sequence};

use crate::core::genome::Genome;
use crate::core::region::ProphageCall;

/// Build the FASTA record for one call, or `None` when the genome carries no
/// sequence for it
pub fn prophage_record(genome: &Genome, call: &ProphageCall) -> Option<fasta::Record> {
    let bases = genome.subsequence(call.start, call.end)?;

    let mut description = format!(
        "{}:{}-{} length={} confidence={} left={} right={}",
        genome.id,
        call.start,
        call.end,
        call.len(),
        call.confidence,
        call.left,
        call.right,
    );
    if let Some(md5) = &call.sequence_md5 {
        description.push_str(&format!(" md5={md5}"));
    }

    Some(fasta::Record::new(
        Definition::new(call.id.as_str(), Some(description.into())),
        Sequence::from(bases.to_vec()),
    ))
}

/// Write every call that has sequence; returns the number of records written
///
/// # Errors
///
/// Returns any I/O error from the underlying writer.
pub fn write_prophages<'a, W, I>(writer: W, calls: I) -> io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = (&'a Genome, &'a ProphageCall)>,
{
    let mut writer = fasta::io::Writer::new(writer);
    let mut written = 0;
    for (genome, call) in calls {
        match prophage_record(genome, call) {
            Some(record) => {
                writer.write_record(&record)?;
                written += 1;
            }
            None => tracing::warn!(call = %call.id, "no sequence available, not extracted"),
        }
    }
    Ok(written)
}

/// [`write_prophages`] to a new file at `path`
///
/// # Errors
///
/// Returns an I/O error if the file cannot be created or written.
pub fn write_prophage_file<'a, I>(path: &Path, calls: I) -> io::Result<usize>
where
    I: IntoIterator<Item = (&'a Genome, &'a ProphageCall)>,
{
    let file = std::fs::File::create(path)?;
    let mut buffered = io::BufWriter::new(file);
    let written = write_prophages(&mut buffered, calls)?;
    buffered.flush()?;
    Ok(written)
}
