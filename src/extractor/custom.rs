use crate::extractor::RecordExtractor;
use crate::processing::policy::SourceOrdering;

type RecordsFn<E, R> = Box<dyn Fn(&E) -> Vec<R> + Send + Sync>;
type RecordIdFn<R> = Box<dyn Fn(&R) -> Option<String> + Send + Sync>;

/// Extractor assembled from closures, for event sources without a built-in
/// adapter.
///
/// ```rust
/// use batch_core::extractor::{FnExtractor, RecordExtractor};
/// use batch_core::processing::SourceOrdering;
///
/// let extractor = FnExtractor::new(
///     "jobs",
///     SourceOrdering::Unordered,
///     |jobs: &Vec<(String, u32)>| jobs.clone(),
///     |job: &(String, u32)| Some(job.0.clone()),
/// );
/// let records = extractor.extract(&vec![("a".to_string(), 1)]).unwrap();
/// assert_eq!(records[0].record_id, "a");
/// ```
pub struct FnExtractor<E, R> {
    source_name: &'static str,
    ordering: SourceOrdering,
    records: RecordsFn<E, R>,
    record_id: RecordIdFn<R>,
}

impl<E, R> FnExtractor<E, R> {
    pub fn new<RF, IF>(
        source_name: &'static str,
        ordering: SourceOrdering,
        records: RF,
        record_id: IF,
    ) -> Self
    where
        RF: Fn(&E) -> Vec<R> + Send + Sync + 'static,
        IF: Fn(&R) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            source_name,
            ordering,
            records: Box::new(records),
            record_id: Box::new(record_id),
        }
    }
}

impl<E, R> RecordExtractor for FnExtractor<E, R>
where
    E: Sync,
    R: Clone + Send + Sync + 'static,
{
    type Event = E;
    type Record = R;

    fn source_name(&self) -> &'static str {
        self.source_name
    }

    fn records(&self, event: &E) -> Vec<R> {
        (self.records)(event)
    }

    fn record_id(&self, record: &R) -> Option<String> {
        (self.record_id)(record)
    }

    fn ordering(&self, _event: &E) -> SourceOrdering {
        self.ordering
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BatchError;

    #[derive(Clone)]
    struct Job {
        key: String,
    }

    fn extractor() -> FnExtractor<Vec<Job>, Job> {
        FnExtractor::new(
            "jobs",
            SourceOrdering::Ordered,
            |jobs: &Vec<Job>| jobs.clone(),
            |job: &Job| Some(job.key.clone()),
        )
    }

    #[test]
    fn test_closures_drive_extraction() {
        let jobs = vec![
            Job {
                key: "x".to_string(),
            },
            Job {
                key: "y".to_string(),
            },
        ];
        let extractor = extractor();
        let records = extractor.extract(&jobs).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].record_id, "y");
        assert_eq!(extractor.ordering(&jobs), SourceOrdering::Ordered);
        assert_eq!(extractor.source_name(), "jobs");
    }

    #[test]
    fn test_duplicate_keys_rejected() {
        let jobs = vec![
            Job {
                key: "x".to_string(),
            },
            Job {
                key: "x".to_string(),
            },
        ];
        assert!(matches!(
            extractor().extract(&jobs),
            Err(BatchError::DuplicateRecordId(_))
        ));
    }
}
