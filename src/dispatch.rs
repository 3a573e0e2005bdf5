use std::io;
use tracing::{info, instrument};

use crate::backend::{ChainRpc, ObjectStore};
use crate::commands::buckets::query_user_buckets;
use crate::commands::credits::query_account_credits;
use crate::commands::files::query_user_files;
use crate::commands::s3::{query_s3_buckets, query_s3_objects};
use crate::commands::storage::query_total_storage;
use crate::commands::Outcome;
use crate::error::QueryError;
use crate::report::Reporter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountQuery {
    Files,
    Storage,
    Buckets,
    Credits,
}

impl AccountQuery {
    pub const fn flag(self) -> &'static str {
        match self {
            Self::Files => "--files",
            Self::Storage => "--storage",
            Self::Buckets => "--buckets",
            Self::Credits => "--credits",
        }
    }
}

/// Account sections of `hippius-query`, in report order.
pub const QUERY_ACCOUNT_ORDER: [AccountQuery; 3] = [
    AccountQuery::Files,
    AccountQuery::Storage,
    AccountQuery::Credits,
];

/// Account sections of `hippius-account`, in report order.
pub const ACCOUNT_ORDER: [AccountQuery; 4] = [
    AccountQuery::Files,
    AccountQuery::Storage,
    AccountQuery::Buckets,
    AccountQuery::Credits,
];

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Query {
    S3Buckets,
    S3Objects { bucket: String, prefix: String },
    Account { account: String, query: AccountQuery },
    /// Account flags were given, but no account to run them for.
    AccountMissing { requested: Vec<AccountQuery> },
}

impl Query {
    pub const fn needs_object_store(&self) -> bool {
        matches!(self, Self::S3Buckets | Self::S3Objects { .. })
    }
}

/// The ordered list of queries one run will dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Selection {
    queries: Vec<Query>,
}

impl Selection {
    pub const fn new() -> Self {
        Self {
            queries: Vec::new(),
        }
    }

    pub fn push(
        mut self,
        query: Query,
    ) -> Self {
        self.queries.push(query);
        self
    }

    /// Account sections, in `order`.
    ///
    /// Nothing requested means everything in `order`; requested sections without an account
    /// turn into a single `AccountMissing` entry.
    pub fn with_account(
        mut self,
        account: Option<&str>,
        requested: &[AccountQuery],
        order: &[AccountQuery],
    ) -> Self {
        match account {
            Some(account) => {
                let wanted = order
                    .iter()
                    .filter(|query| requested.is_empty() || requested.contains(*query));

                for query in wanted {
                    self.queries.push(Query::Account {
                        account: account.to_owned(),
                        query: *query,
                    });
                }
            }
            None if !requested.is_empty() => {
                let mut requested = requested.to_vec();
                requested.sort_unstable();
                requested.dedup();
                self.queries.push(Query::AccountMissing { requested });
            }
            None => {}
        }

        self
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Query> {
        self.queries.iter()
    }

    pub fn needs_object_store(&self) -> bool {
        self.queries.iter().any(Query::needs_object_store)
    }
}

/// Every dispatched query with the outcome of its section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub outcomes: Vec<(Query, Outcome)>,
}

impl RunSummary {
    /// A query that could not even start makes the run fail.
    pub fn exit_code(&self) -> i32 {
        let precondition_failed = self.outcomes.iter().any(|(_, outcome)| {
            matches!(outcome, Outcome::Failed(err) if err.is_precondition())
        });

        i32::from(precondition_failed)
    }

    pub fn failures(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|(_, outcome)| outcome.is_failure())
            .count()
    }
}

/// Runs a selection one query at a time; a failing query never stops the next one.
///
/// The only exception is a missing object store: that aborts the run before anything else
/// goes over the wire.
#[derive(Debug)]
pub struct Dispatcher<'a, S, R> {
    store: Option<&'a S>,
    rpc: &'a R,
}

impl<'a, S: ObjectStore, R: ChainRpc> Dispatcher<'a, S, R> {
    pub const fn new(
        store: Option<&'a S>,
        rpc: &'a R,
    ) -> Self {
        Self { store, rpc }
    }

    #[instrument(skip_all, fields(queries = selection.len()))]
    pub async fn run(
        &self,
        selection: &Selection,
        reporter: &mut Reporter,
    ) -> io::Result<RunSummary> {
        let mut summary = RunSummary::default();
        let mut previous: Option<&Query> = None;

        for query in selection.iter() {
            if matches!(
                (previous, query),
                (Some(Query::Account { .. }), Query::Account { .. })
            ) {
                reporter.blank()?;
            }
            previous = Some(query);

            let outcome = self.dispatch(query, reporter).await?;
            let abort = matches!(outcome, Outcome::Failed(QueryError::MissingCredentials));

            info!(?query, ?outcome, "query finished");
            summary.outcomes.push((query.clone(), outcome));

            if abort {
                break;
            }
        }

        reporter.flush()?;
        Ok(summary)
    }

    async fn dispatch(
        &self,
        query: &Query,
        reporter: &mut Reporter,
    ) -> io::Result<Outcome> {
        match query {
            Query::S3Buckets => match self.store {
                Some(store) => query_s3_buckets(store, reporter).await,
                None => precondition(reporter, QueryError::MissingCredentials),
            },
            Query::S3Objects { bucket, prefix } => match self.store {
                Some(store) => query_s3_objects(store, bucket, prefix, reporter).await,
                None => precondition(reporter, QueryError::MissingCredentials),
            },
            Query::Account { account, query } => self.account_query(account, *query, reporter).await,
            Query::AccountMissing { requested } => {
                let flags: Vec<&str> = requested.iter().map(|query| query.flag()).collect();
                precondition(
                    reporter,
                    QueryError::MissingAccount {
                        flags: flags.join(", "),
                    },
                )
            }
        }
    }

    async fn account_query(
        &self,
        account: &str,
        query: AccountQuery,
        reporter: &mut Reporter,
    ) -> io::Result<Outcome> {
        match query {
            AccountQuery::Files => query_user_files(self.rpc, account, reporter).await,
            AccountQuery::Storage => query_total_storage(self.rpc, account, reporter).await,
            AccountQuery::Buckets => query_user_buckets(self.rpc, account, reporter).await,
            AccountQuery::Credits => query_account_credits(self.rpc, account, reporter).await,
        }
    }
}

fn precondition(
    reporter: &mut Reporter,
    err: QueryError,
) -> io::Result<Outcome> {
    reporter.error(&err)?;

    Ok(Outcome::Failed(err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryResult;
    use crate::models::{BucketEntry, BucketRecord, BucketSize, FileRecord, ObjectEntry};
    use std::cell::RefCell;

    #[derive(Default)]
    struct FakeStore {
        calls: RefCell<Vec<String>>,
        buckets: Vec<BucketEntry>,
        objects: Vec<ObjectEntry>,
    }

    impl ObjectStore for FakeStore {
        async fn list_buckets(&self) -> QueryResult<Vec<BucketEntry>> {
            self.calls.borrow_mut().push(String::from("buckets"));
            Ok(self.buckets.clone())
        }

        async fn list_objects(
            &self,
            bucket: &str,
            prefix: &str,
        ) -> QueryResult<Vec<ObjectEntry>> {
            self.calls
                .borrow_mut()
                .push(format!("objects:{bucket}:{prefix}"));
            Ok(self.objects.clone())
        }
    }

    struct FakeChain {
        calls: RefCell<Vec<String>>,
        files: QueryResult<Vec<FileRecord>>,
        storage: QueryResult<u64>,
        buckets: QueryResult<Vec<BucketRecord>>,
        credits: QueryResult<f64>,
    }

    impl Default for FakeChain {
        fn default() -> Self {
            Self {
                calls: RefCell::default(),
                files: Ok(vec![FileRecord {
                    hash: Some(String::from("QmHash")),
                    name: Some(String::from("backup.tar")),
                    size: Some(2048),
                    miners: Some(vec![String::from("5Miner")]),
                }]),
                storage: Ok(1_048_576),
                buckets: Ok(vec![BucketRecord {
                    name: String::from("photos"),
                    size: BucketSize::Total(4096),
                }]),
                credits: Ok(12.5),
            }
        }
    }

    impl FakeChain {
        fn record(
            &self,
            what: &str,
            account: &str,
        ) {
            self.calls.borrow_mut().push(format!("{what}:{account}"));
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl ChainRpc for FakeChain {
        async fn list_user_files(
            &self,
            account: &str,
        ) -> QueryResult<Vec<FileRecord>> {
            self.record("files", account);
            self.files.clone()
        }

        async fn total_storage(
            &self,
            account: &str,
        ) -> QueryResult<u64> {
            self.record("storage", account);
            self.storage.clone()
        }

        async fn list_user_buckets(
            &self,
            account: &str,
        ) -> QueryResult<Vec<BucketRecord>> {
            self.record("buckets", account);
            self.buckets.clone()
        }

        async fn account_credits(
            &self,
            account: &str,
        ) -> QueryResult<f64> {
            self.record("credits", account);
            self.credits.clone()
        }
    }

    fn account_selection(requested: &[AccountQuery]) -> Selection {
        Selection::new().with_account(Some("ADDR123"), requested, &QUERY_ACCOUNT_ORDER)
    }

    #[test]
    fn no_flags_selects_everything_in_order() {
        let selection = Selection::new().with_account(Some("ADDR123"), &[], &ACCOUNT_ORDER);
        let kinds: Vec<AccountQuery> = selection
            .iter()
            .filter_map(|query| match query {
                Query::Account { query, .. } => Some(*query),
                _ => None,
            })
            .collect();

        assert_eq!(kinds, ACCOUNT_ORDER.to_vec());
    }

    #[test]
    fn requested_flags_follow_report_order() {
        let selection = account_selection(&[AccountQuery::Credits, AccountQuery::Files]);

        assert_eq!(
            selection.iter().cloned().collect::<Vec<_>>(),
            vec![
                Query::Account {
                    account: String::from("ADDR123"),
                    query: AccountQuery::Files
                },
                Query::Account {
                    account: String::from("ADDR123"),
                    query: AccountQuery::Credits
                },
            ]
        );
    }

    #[test]
    fn flags_without_account_are_kept_as_missing() {
        let selection = Selection::new().with_account(
            None,
            &[AccountQuery::Storage, AccountQuery::Files, AccountQuery::Files],
            &QUERY_ACCOUNT_ORDER,
        );

        assert_eq!(
            selection.iter().cloned().collect::<Vec<_>>(),
            vec![Query::AccountMissing {
                requested: vec![AccountQuery::Files, AccountQuery::Storage]
            }]
        );
        assert!(Selection::new().with_account(None, &[], &QUERY_ACCOUNT_ORDER).is_empty());
    }

    #[tokio::test]
    async fn files_and_credits_issue_exactly_two_calls() {
        let chain = FakeChain::default();
        let dispatcher = Dispatcher::<FakeStore, _>::new(None, &chain);
        let mut reporter = Reporter::buffered();

        let summary = dispatcher
            .run(
                &account_selection(&[AccountQuery::Files, AccountQuery::Credits]),
                &mut reporter,
            )
            .await
            .expect("run");

        assert_eq!(chain.calls(), vec!["files:ADDR123", "credits:ADDR123"]);
        assert_eq!(summary.exit_code(), 0);

        let out = reporter.stdout_text();
        assert_eq!(out.matches("User Files (IPFS/Blockchain)").count(), 1);
        assert_eq!(out.matches("Account Credits").count(), 1);
        assert!(!out.contains("Total Storage Used"));
        assert!(out.find("User Files").expect("files") < out.find("Account Credits").expect("credits"));
    }

    #[tokio::test]
    async fn blank_line_only_between_account_sections() {
        let chain = FakeChain::default();
        let dispatcher = Dispatcher::<FakeStore, _>::new(None, &chain);
        let mut reporter = Reporter::buffered();

        dispatcher
            .run(
                &account_selection(&[AccountQuery::Storage, AccountQuery::Credits]),
                &mut reporter,
            )
            .await
            .expect("run");

        let out = reporter.stdout_text();
        assert!(out.contains("Storage query complete\n\nQuerying credits for account: ADDR123"));
        assert!(out.ends_with("Credit balance is healthy\n"));
    }

    #[tokio::test]
    async fn transport_failure_does_not_stop_later_queries() {
        let chain = FakeChain {
            files: Err(QueryError::Connection(String::from("connection refused"))),
            ..FakeChain::default()
        };
        let dispatcher = Dispatcher::<FakeStore, _>::new(None, &chain);
        let mut reporter = Reporter::buffered();

        let summary = dispatcher
            .run(&account_selection(&[]), &mut reporter)
            .await
            .expect("run");

        assert_eq!(
            chain.calls(),
            vec!["files:ADDR123", "storage:ADDR123", "credits:ADDR123"]
        );
        assert_eq!(summary.failures(), 1);
        assert_eq!(summary.exit_code(), 0);

        let err = reporter.stderr_text();
        assert!(err.contains("ERROR: Connection Error: connection refused"));
        assert!(err.contains("ERROR: Failed to retrieve user files"));

        let out = reporter.stdout_text();
        assert!(out.contains("Total: 1.00 MB (1,048,576 bytes)"));
        assert!(out.contains("Free Credits: 12.5000"));
        assert!(out.contains("Credit balance is healthy"));
    }

    #[tokio::test]
    async fn empty_listing_is_a_warning() {
        let chain = FakeChain {
            files: Ok(Vec::new()),
            ..FakeChain::default()
        };
        let dispatcher = Dispatcher::<FakeStore, _>::new(None, &chain);
        let mut reporter = Reporter::buffered();

        let summary = dispatcher
            .run(&account_selection(&[AccountQuery::Files]), &mut reporter)
            .await
            .expect("run");

        assert_eq!(summary.outcomes[0].1, Outcome::Empty);
        assert_eq!(summary.outcomes[0].1.count(), 0);
        assert_eq!(summary.failures(), 0);
        assert!(reporter.stdout_text().contains("No files found for this account"));
        assert!(reporter.stderr_text().is_empty());
    }

    #[tokio::test]
    async fn missing_credentials_abort_before_any_call() {
        let chain = FakeChain::default();
        let dispatcher = Dispatcher::<FakeStore, _>::new(None, &chain);
        let mut reporter = Reporter::buffered();
        let selection = Selection::new()
            .push(Query::S3Buckets)
            .with_account(Some("ADDR123"), &[], &QUERY_ACCOUNT_ORDER);

        let summary = dispatcher.run(&selection, &mut reporter).await.expect("run");

        assert!(chain.calls().is_empty());
        assert_eq!(summary.outcomes.len(), 1);
        assert_eq!(summary.exit_code(), 1);
        assert!(
            reporter
                .stderr_text()
                .contains("Set HIPPIUS_S3_ACCESS_KEY and HIPPIUS_S3_SECRET_KEY environment variables")
        );
    }

    #[tokio::test]
    async fn missing_account_skips_only_its_branch() {
        let store = FakeStore {
            buckets: vec![BucketEntry {
                name: String::from("snapshots"),
                created: None,
            }],
            ..FakeStore::default()
        };
        let chain = FakeChain::default();
        let dispatcher = Dispatcher::new(Some(&store), &chain);
        let mut reporter = Reporter::buffered();
        let selection = Selection::new()
            .push(Query::S3Buckets)
            .with_account(None, &[AccountQuery::Files], &QUERY_ACCOUNT_ORDER);

        let summary = dispatcher.run(&selection, &mut reporter).await.expect("run");

        assert_eq!(store.calls.borrow().clone(), vec!["buckets"]);
        assert!(chain.calls().is_empty());
        assert_eq!(summary.outcomes[0].1, Outcome::Listed(1));
        assert_eq!(summary.exit_code(), 1);
        assert!(reporter.stderr_text().contains("--files requires --account"));
        assert!(reporter.stdout_text().contains("Total buckets: 1"));
    }

    #[tokio::test]
    async fn object_listing_reports_target() {
        let store = FakeStore {
            objects: vec![ObjectEntry {
                key: String::from("snapshots/db.sql"),
                size: 10,
                last_modified: None,
            }],
            ..FakeStore::default()
        };
        let chain = FakeChain::default();
        let dispatcher = Dispatcher::new(Some(&store), &chain);
        let mut reporter = Reporter::buffered();
        let selection = Selection::new().push(Query::S3Objects {
            bucket: String::from("backups"),
            prefix: String::from("snapshots/"),
        });

        let summary = dispatcher.run(&selection, &mut reporter).await.expect("run");

        assert_eq!(store.calls.borrow().clone(), vec!["objects:backups:snapshots/"]);
        assert_eq!(summary.outcomes[0].1, Outcome::Listed(1));

        let out = reporter.stdout_text();
        assert!(out.contains("Listing objects in s3://backups/snapshots/..."));
        assert!(out.contains("Objects in s3://backups/snapshots/"));
        assert!(out.contains("snapshots/db.sql"));
        assert!(out.contains("Total objects: 1"));
    }

    #[tokio::test]
    async fn empty_bucket_warns_with_target() {
        let store = FakeStore::default();
        let chain = FakeChain::default();
        let dispatcher = Dispatcher::new(Some(&store), &chain);
        let mut reporter = Reporter::buffered();
        let selection = Selection::new().push(Query::S3Objects {
            bucket: String::from("backups"),
            prefix: String::new(),
        });

        let summary = dispatcher.run(&selection, &mut reporter).await.expect("run");

        assert_eq!(summary.outcomes[0].1, Outcome::Empty);
        assert!(reporter.stdout_text().contains("No objects found in s3://backups/"));
    }

    #[tokio::test]
    async fn rpc_error_payload_fails_only_that_section() {
        let chain = FakeChain {
            storage: Err(QueryError::Rpc(String::from("Method not found (code -32601)"))),
            ..FakeChain::default()
        };
        let dispatcher = Dispatcher::<FakeStore, _>::new(None, &chain);
        let mut reporter = Reporter::buffered();

        let summary = dispatcher
            .run(
                &account_selection(&[AccountQuery::Storage, AccountQuery::Credits]),
                &mut reporter,
            )
            .await
            .expect("run");

        assert_eq!(chain.calls(), vec!["storage:ADDR123", "credits:ADDR123"]);
        assert!(summary.outcomes[0].1.is_failure());
        assert_eq!(summary.outcomes[1].1, Outcome::Reported);
        assert!(reporter.stderr_text().contains("RPC Error: Method not found"));
        assert!(!reporter.stdout_text().contains("Total Storage Used"));
    }

    #[tokio::test]
    async fn low_credits_warn() {
        let chain = FakeChain {
            credits: Ok(0.25),
            ..FakeChain::default()
        };
        let dispatcher = Dispatcher::<FakeStore, _>::new(None, &chain);
        let mut reporter = Reporter::buffered();

        dispatcher
            .run(&account_selection(&[AccountQuery::Credits]), &mut reporter)
            .await
            .expect("run");

        let out = reporter.stdout_text();
        assert!(out.contains("Free Credits: 0.2500"));
        assert!(out.contains("Low credit balance - consider adding credits"));
    }

    #[tokio::test]
    async fn account_buckets_render_as_table() {
        let chain = FakeChain::default();
        let dispatcher = Dispatcher::<FakeStore, _>::new(None, &chain);
        let mut reporter = Reporter::buffered();
        let selection =
            Selection::new().with_account(Some("ADDR123"), &[AccountQuery::Buckets], &ACCOUNT_ORDER);

        let summary = dispatcher.run(&selection, &mut reporter).await.expect("run");

        assert_eq!(chain.calls(), vec!["buckets:ADDR123"]);
        assert_eq!(summary.outcomes[0].1, Outcome::Listed(1));

        let out = reporter.stdout_text();
        assert!(out.contains("User Buckets (Blockchain)"));
        assert!(out.contains("photos"));
        assert!(out.contains("4.00 KB"));
    }
}
