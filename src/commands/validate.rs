use crate::{
    cli::ValidateArgs,
    constants::{DEFAULT_BATCH_SIZE, DEFAULT_QUEUE_CAPACITY},
    core::codec::{LineTransform, SpaceDelimitedTransform, VcfCodec},
    io::vcf_reader::{NumberedLine, VcfReader},
    utils::util::{format_number_with_commas, Result},
};
use crossbeam_channel::{bounded, Receiver, Sender};
use rayon::{prelude::*, ThreadPoolBuilder};
use std::{
    any::Any,
    path::Path,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
};

#[derive(Debug, Clone)]
pub struct ValidateOptions {
    pub num_threads: usize,
    pub batch_size: usize,
    pub queue_capacity: usize,
    pub skip_genotypes: bool,
    pub catch_all: bool,
    pub space_delimited: bool,
}

impl From<&ValidateArgs> for ValidateOptions {
    fn from(args: &ValidateArgs) -> Self {
        Self {
            num_threads: args.num_threads,
            batch_size: DEFAULT_BATCH_SIZE,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            skip_genotypes: args.skip_genotypes,
            catch_all: args.catch_all,
            space_delimited: args.space_delimited,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationSummary {
    pub records: usize,
    pub failures: usize,
}

pub fn validate(args: ValidateArgs) -> Result<()> {
    let options = ValidateOptions::from(&args);
    let summary = validate_file(&args.vcf, &options)?;
    log::info!(
        "Validated {} records, {} failed",
        format_number_with_commas(summary.records),
        format_number_with_commas(summary.failures)
    );
    if summary.failures > 0 {
        return Err(crate::vcf_error!(
            "{} of {} data lines in {} failed validation",
            format_number_with_commas(summary.failures),
            format_number_with_commas(summary.records + summary.failures),
            args.vcf.display()
        ));
    }
    Ok(())
}

pub fn line_transform(space_delimited: bool) -> Option<Arc<dyn LineTransform>> {
    if space_delimited {
        Some(Arc::new(SpaceDelimitedTransform))
    } else {
        None
    }
}

/// Decode every data line of `path`.
///
/// Without `catch_all` the first failure is returned as the error. With it every
/// failure is logged and counted.
pub fn validate_file(path: &Path, options: &ValidateOptions) -> Result<ValidationSummary> {
    let mut reader = VcfReader::from_path(
        path,
        line_transform(options.space_delimited),
        options.skip_genotypes,
    )?;
    let codec = reader.codec().clone();
    log::debug!("Validating {} with {:?}", path.display(), codec);

    let (batch_sender, batch_receiver): (Sender<Vec<NumberedLine>>, Receiver<Vec<NumberedLine>>) =
        bounded(options.queue_capacity);
    let batch_size = options.batch_size.max(1);
    let reader_thread = thread::spawn(move || -> Result<()> {
        log::debug!("Reader thread started.");
        let mut batch = Vec::with_capacity(batch_size);
        while let Some(line) = reader.read_line()? {
            batch.push(line);
            if batch.len() == batch_size {
                let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
                if batch_sender.send(full).is_err() {
                    log::debug!("Reader: workers stopped, ending early");
                    return Ok(());
                }
            }
        }
        if !batch.is_empty() && batch_sender.send(batch).is_err() {
            log::debug!("Reader: workers stopped before the last batch");
        }
        log::debug!("Reader thread finished.");
        Ok(())
    });

    log::debug!(
        "Initializing validation thread pool with {} threads...",
        options.num_threads
    );
    let pool = ThreadPoolBuilder::new()
        .num_threads(options.num_threads)
        .thread_name(|i| format!("vcfcodec-validate-{i}"))
        .build()
        .map_err(|e| crate::vcf_error!("Failed to initialize validation thread pool: {e}"))?;

    let records = AtomicUsize::new(0);
    let failures = AtomicUsize::new(0);
    let catch_all = options.catch_all;
    let worker_result: Result<()> = pool.install(|| {
        batch_receiver
            .into_iter()
            .par_bridge()
            .try_for_each(|batch| validate_batch(&codec, batch, catch_all, &records, &failures))
    });

    let reader_result = join_thread_result("Reader", reader_thread);
    worker_result?;
    reader_result?;

    Ok(ValidationSummary {
        records: records.into_inner(),
        failures: failures.into_inner(),
    })
}

fn validate_batch(
    codec: &VcfCodec,
    batch: Vec<NumberedLine>,
    catch_all: bool,
    records: &AtomicUsize,
    failures: &AtomicUsize,
) -> Result<()> {
    for line in batch {
        match codec.decode(&line.text) {
            Ok(_) => {
                records.fetch_add(1, Ordering::Relaxed);
            }
            Err(e) => {
                failures.fetch_add(1, Ordering::Relaxed);
                let e = e.at_line(line.line_number);
                if !catch_all {
                    return Err(e);
                }
                log::warn!("{e}");
            }
        }
    }
    Ok(())
}

fn panic_payload_message(panic_payload: &(dyn Any + Send + 'static)) -> String {
    if let Some(message) = panic_payload.downcast_ref::<&str>() {
        return (*message).to_owned();
    }
    if let Some(message) = panic_payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_owned()
}

fn join_thread_result(thread_name: &str, handle: thread::JoinHandle<Result<()>>) -> Result<()> {
    match handle.join() {
        Ok(result) => result.map_err(|e| crate::vcf_error!("{thread_name} thread failed: {e}")),
        Err(panic_payload) => Err(crate::vcf_error!(
            "{thread_name} thread panicked: {}",
            panic_payload_message(panic_payload.as_ref())
        )),
    }
}
