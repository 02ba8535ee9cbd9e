use core::{cell::Cell, time::Duration};
use std::{collections::HashSet, rc::Rc, sync::Mutex, thread::scope};

use crate::{
    AtomicSnowflakeGenerator, DomainHash, Error, GeneratorConfig, IdGenStatus, LockSnowflakeGenerator,
    MonotonicClock, Qualifier, QualifierProfile, RegressionPolicy, Siq, SiqCache, SiqGenerator, SiqType,
    SnowflakeConfig, SnowflakeGenerator, SnowflakeId, Stall, TWITTER_EPOCH, TimeSource, Timestamp,
};

const T0: u64 = 1_577_833_200;
const KNOWN: u128 = 7_451_106_619_238_957_490_390_643_507_207;

struct MockTime {
    now: Duration,
}

impl TimeSource for MockTime {
    fn now(&self) -> Duration {
        self.now
    }
}

/// Clock whose reading is set by the test.
#[derive(Clone)]
struct SharedMockTime {
    now: Rc<Cell<Duration>>,
}

impl SharedMockTime {
    fn at(now: Duration) -> Self {
        Self {
            now: Rc::new(Cell::new(now)),
        }
    }

    fn set(&self, now: Duration) {
        self.now.set(now);
    }
}

impl TimeSource for SharedMockTime {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Reads `before` for the first `reads` calls, `after` from then on.
struct AdvanceAfter {
    before: Duration,
    after: Duration,
    reads: usize,
    count: Cell<usize>,
}

impl TimeSource for AdvanceAfter {
    fn now(&self) -> Duration {
        let n = self.count.get();
        self.count.set(n + 1);
        if n < self.reads { self.before } else { self.after }
    }
}

trait IdGenStatusExt<T> {
    fn unwrap_ready(self) -> T;
    fn unwrap_pending(self) -> (Duration, Stall);
}

impl<T: core::fmt::Debug> IdGenStatusExt<T> for IdGenStatus<T> {
    fn unwrap_ready(self) -> T {
        match self {
            Self::Ready { id } => id,
            Self::Pending { yield_for, stall } => {
                panic!("unexpected pending ({stall:?}, yield for {yield_for:?})")
            }
        }
    }

    fn unwrap_pending(self) -> (Duration, Stall) {
        match self {
            Self::Ready { id } => panic!("unexpected ready ({id:?})"),
            Self::Pending { yield_for, stall } => (yield_for, stall),
        }
    }
}

fn secs(seconds: u64) -> Duration {
    Duration::from_secs(seconds)
}

/// One fraction unit after `base`.
fn next_tick(base: Duration) -> Duration {
    base + Timestamp::ticks_to_duration(1)
}

fn tick_of(now: Duration) -> u64 {
    Timestamp::from_duration(now).unwrap().to_ticks()
}

fn fixed_generator(config: GeneratorConfig) -> SiqGenerator<MockTime> {
    SiqGenerator::with_time(config, MockTime { now: secs(T0) }).unwrap()
}

#[test]
fn serial_increments_within_same_tick() {
    let generator = fixed_generator(GeneratorConfig::new("").with_shard(3));
    let profile = generator.profile();

    let a = generator.try_poll_id(SiqType::Content).unwrap().unwrap_ready();
    let b = generator.try_poll_id(SiqType::Content).unwrap().unwrap_ready();

    assert_eq!(a.serial(profile), 0);
    assert_eq!(b.serial(profile), 1);
    assert_eq!(a.timestamp(), b.timestamp());
    assert_eq!((a.shard(), b.shard()), (3, 3));
    assert!(a.domain_hash().is_zero() && b.domain_hash().is_zero());
    assert!(a.to_raw() < b.to_raw());
}

#[test]
fn first_id_matches_known_vector() {
    let generator = fixed_generator(GeneratorConfig::new("0").with_shard(0));
    let id = generator.next_id(SiqType::Content).unwrap();
    assert_eq!(id.to_raw(), KNOWN);
    assert_eq!(generator.next_id(SiqType::Content).unwrap().to_raw(), KNOWN + 8);
}

#[test]
fn serial_resets_when_tick_advances() {
    let time = SharedMockTime::at(secs(T0));
    let generator = SiqGenerator::with_time(GeneratorConfig::default(), time.clone()).unwrap();

    for expected in 0..5 {
        let id = generator.try_poll_id(SiqType::Message).unwrap().unwrap_ready();
        assert_eq!(id.serial(QualifierProfile::Compact), expected);
    }

    time.set(next_tick(secs(T0)));
    let id = generator.try_poll_id(SiqType::Message).unwrap().unwrap_ready();
    assert_eq!(id.serial(QualifierProfile::Compact), 0);
    assert_eq!(id.fraction(), 1);
}

#[test]
fn exhausted_serials_stall_until_clock_advances() {
    let time = SharedMockTime::at(secs(T0));
    let generator = SiqGenerator::with_time(GeneratorConfig::default(), time.clone()).unwrap();

    let mut seen = HashSet::new();
    for _ in 0..=2047 {
        let id = generator.try_poll_id(SiqType::Account).unwrap().unwrap_ready();
        assert!(seen.insert(id));
    }

    let (yield_for, stall) = generator.try_poll_id(SiqType::Account).unwrap().unwrap_pending();
    assert_eq!(stall, Stall::SerialExhausted { tick: tick_of(secs(T0)) });
    assert_eq!(yield_for, Timestamp::ticks_to_duration(1));
    // still pending on a second poll: nothing was consumed
    generator.try_poll_id(SiqType::Account).unwrap().unwrap_pending();

    time.set(next_tick(secs(T0)));
    let id = generator.try_poll_id(SiqType::Account).unwrap().unwrap_ready();
    assert_eq!(id.serial(QualifierProfile::Compact), 0);
    assert!(seen.insert(id));
}

#[test]
fn blocking_call_waits_out_exhaustion() {
    // 8192 content serials fit one tick; read 8193 is the stalled poll
    let time = AdvanceAfter {
        before: secs(T0),
        after: next_tick(secs(T0)),
        reads: 8193,
        count: Cell::new(0),
    };
    let generator = SiqGenerator::with_time(GeneratorConfig::default(), time).unwrap();

    let ids = generator.next_ids(SiqType::Content, 8193).unwrap();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
    let last = ids[8192];
    assert_eq!(last.fraction(), 1);
    assert_eq!(last.serial(QualifierProfile::Compact), 0);
}

#[test]
fn exhaustion_past_budget_is_an_error() {
    let generator = fixed_generator(
        GeneratorConfig::default().with_max_wait(Duration::from_millis(1)),
    );
    for _ in 0..8192 {
        generator.next_id(SiqType::Content).unwrap();
    }
    assert_eq!(
        generator.next_id(SiqType::Content).unwrap_err(),
        Error::SerialExhausted { tick: tick_of(secs(T0)) }
    );
}

#[test]
fn clock_regression_blocks_by_default() {
    let time = SharedMockTime::at(secs(T0));
    let generator = SiqGenerator::with_time(
        GeneratorConfig::default().with_max_wait(Duration::from_millis(2)),
        time.clone(),
    )
    .unwrap();

    let first = generator.next_id(SiqType::Content).unwrap();
    time.set(secs(T0 - 1));

    let (yield_for, stall) = generator.try_poll_id(SiqType::Content).unwrap().unwrap_pending();
    let (now, last) = (tick_of(secs(T0 - 1)), tick_of(secs(T0)));
    assert_eq!(stall, Stall::ClockBehind { now, last });
    assert_eq!(yield_for, Duration::from_secs(1));

    assert_eq!(
        generator.next_id(SiqType::Content).unwrap_err(),
        Error::ClockRegression { now, last }
    );

    // once the clock catches up, minting continues after the last id
    time.set(secs(T0));
    let next = generator.next_id(SiqType::Content).unwrap();
    assert!(next > first);
    assert_eq!(next.serial(QualifierProfile::Compact), 1);
}

#[test]
fn clock_regression_fails_fast_when_configured() {
    let time = SharedMockTime::at(secs(T0));
    let generator = SiqGenerator::with_time(
        GeneratorConfig::default().with_regression_policy(RegressionPolicy::FailFast),
        time.clone(),
    )
    .unwrap();

    generator.next_id(SiqType::Content).unwrap();
    time.set(next_tick(secs(T0 - 5)));

    let err = generator.try_poll_id(SiqType::Content).unwrap_err();
    assert!(matches!(err, Error::ClockRegression { .. }));
    assert!(matches!(
        generator.next_id(SiqType::Content).unwrap_err(),
        Error::ClockRegression { .. }
    ));
}

#[test]
fn mixed_categories_stay_strictly_increasing() {
    let generator = fixed_generator(GeneratorConfig::new("example.com").with_shard(9));
    let types = [
        SiqType::Content,
        SiqType::Account,
        SiqType::Thread,
        SiqType::Content,
        SiqType::Channel,
        SiqType::OneToMany,
    ];

    let mut last: Option<Siq> = None;
    for ty in types.iter().cycle().take(1_000) {
        let id = generator.next_id(*ty).unwrap();
        assert_eq!(id.siq_type(QualifierProfile::Compact), Some(*ty));
        if let Some(prev) = last {
            assert!(id > prev, "{id:?} after {prev:?}");
        }
        last = Some(id);
    }
}

#[test]
fn real_clock_ids_are_monotonic() {
    let generator =
        SiqGenerator::with_time(GeneratorConfig::new("example.com"), MonotonicClock::new())
            .unwrap();
    let ids = generator.next_ids(SiqType::Message, 100_000).unwrap();
    assert!(ids.windows(2).all(|w| w[0] < w[1]));
}

#[test]
fn ids_are_unique_across_threads() {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 20_000;

    let generator = SiqGenerator::with_time(
        GeneratorConfig::new("example.com").with_shard(1),
        MonotonicClock::new(),
    )
    .unwrap();
    let seen = Mutex::new(HashSet::with_capacity(THREADS * IDS_PER_THREAD));

    scope(|s| {
        for t in 0..THREADS {
            let generator = &generator;
            let seen = &seen;
            s.spawn(move || {
                let ty = SiqType::ALL[t % SiqType::ALL.len()];
                let mut local = Vec::with_capacity(IDS_PER_THREAD);
                for _ in 0..IDS_PER_THREAD {
                    local.push(generator.next_id(ty).unwrap());
                }
                assert!(local.windows(2).all(|w| w[0] < w[1]));
                let mut seen = seen.lock().unwrap();
                for id in local {
                    assert!(seen.insert(id));
                }
            });
        }
    });

    assert_eq!(seen.lock().unwrap().len(), THREADS * IDS_PER_THREAD);
}

/// Every thread races the others for the lock or CAS on a real clock; none
/// may see another's newer tick as a regression.
fn run_fail_fast_across_threads<G: Sync>(
    generator: &G,
    next: impl Fn(&G) -> Result<(), Error> + Sync,
) {
    const THREADS: usize = 8;
    const CALLS_PER_THREAD: usize = 50_000;

    let failures = Mutex::new(Vec::new());
    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..CALLS_PER_THREAD {
                    if let Err(e) = next(generator) {
                        failures.lock().unwrap().push(e);
                    }
                }
            });
        }
    });
    let failures = failures.into_inner().unwrap();
    assert!(failures.is_empty(), "{} calls failed: {failures:?}", failures.len());
}

#[test]
fn fail_fast_sees_no_regression_under_contention() {
    let generator = SiqGenerator::with_time(
        GeneratorConfig::new("example.com").with_regression_policy(RegressionPolicy::FailFast),
        MonotonicClock::new(),
    )
    .unwrap();
    run_fail_fast_across_threads(&generator, |g| g.next_id(SiqType::Content).map(drop));
}

#[test]
fn leaf_bit_follows_category() {
    for profile in [QualifierProfile::Compact, QualifierProfile::Wide] {
        let generator = fixed_generator(GeneratorConfig::default().with_profile(profile));
        assert!(generator.next_id(SiqType::Content).unwrap().is_leaf());
        assert!(generator.next_id(SiqType::Relationship).unwrap().is_leaf());
        assert!(!generator.next_id(SiqType::Account).unwrap().is_leaf());
        assert!(!generator.next_id(SiqType::Channel).unwrap().is_leaf());
    }
}

#[test]
fn wide_profile_has_1024_serials_per_tick() {
    let generator = fixed_generator(GeneratorConfig::default().with_profile(QualifierProfile::Wide));
    for expected in 0..1024 {
        let id = generator.try_poll_id(SiqType::Product).unwrap().unwrap_ready();
        assert_eq!(id.serial(QualifierProfile::Wide), expected);
        assert_eq!(id.siq_type(QualifierProfile::Wide), Some(SiqType::Product));
    }
    generator.try_poll_id(SiqType::Product).unwrap().unwrap_pending();
}

#[test]
fn raw_qualifier_is_stored_verbatim() {
    let generator = fixed_generator(GeneratorConfig::default());
    // well formed under Compact, but no category uses it
    let qualifier = Qualifier::new(0b11100, 5).unwrap();

    for expected in 0..2 {
        let id = generator.next_id_with(qualifier).unwrap();
        assert_eq!(id.word() & 0b11111, 0b11100);
        assert!(!id.is_leaf());

        let fields = generator.decode(id);
        assert_eq!(fields.qualifier, qualifier);
        assert_eq!(fields.serial, expected);
        assert_eq!(fields.siq_type(generator.profile()), None);
    }
}

#[test]
fn raw_qualifier_must_decode_under_profile() {
    let generator = fixed_generator(GeneratorConfig::default());
    let mismatched = Qualifier::new(0b10, 2).unwrap();
    assert_eq!(
        generator.try_poll_with(mismatched).unwrap_err(),
        Error::QualifierMismatch {
            value: 0b10,
            bits: 2,
            profile: QualifierProfile::Compact
        }
    );
    assert!(generator.next_id_with(mismatched).is_err());

    // rejected calls consume no serial
    let id = generator.next_id(SiqType::Content).unwrap();
    assert_eq!(id.serial(QualifierProfile::Compact), 0);

    let wide = fixed_generator(GeneratorConfig::default().with_profile(QualifierProfile::Wide));
    assert!(matches!(
        wide.try_poll_with(Qualifier::new(7, 3).unwrap()),
        Err(Error::QualifierMismatch { .. })
    ));
    let custom = Qualifier::new(63, 6).unwrap();
    let fields = wide.decode(wide.next_id_with(custom).unwrap());
    assert_eq!(fields.qualifier, custom);
    assert_eq!(fields.serial, 0);
}

#[test]
fn decode_recovers_configured_fields() {
    let generator = fixed_generator(GeneratorConfig::new("example.com").with_shard(200));
    let fields = generator.decode(generator.next_id(SiqType::Invite).unwrap());
    assert_eq!(fields.timestamp, Timestamp::new(T0, 0).unwrap());
    assert_eq!(fields.shard, 200);
    assert_eq!(fields.domain, DomainHash::of("example.com"));
    assert_eq!(fields.serial, 0);
    assert_eq!(fields.siq_type(generator.profile()), Some(SiqType::Invite));
}

#[test]
fn resumes_after_persisted_id() {
    let first = fixed_generator(GeneratorConfig::default().with_shard(0));
    let mut last = first.next_id(SiqType::Content).unwrap();
    for _ in 0..5 {
        last = first.next_id(SiqType::Content).unwrap();
    }

    let resumed = fixed_generator(GeneratorConfig::default().with_shard(0)).resume_after(last);
    let next = resumed.next_id(SiqType::Content).unwrap();
    assert!(next > last);
    assert_eq!(next.serial(QualifierProfile::Compact), 6);

    let time = SharedMockTime::at(secs(T0 - 1));
    let early = SiqGenerator::with_time(GeneratorConfig::default(), time)
        .unwrap()
        .resume_after(last);
    let (_, stall) = early.try_poll_id(SiqType::Content).unwrap().unwrap_pending();
    assert!(matches!(stall, Stall::ClockBehind { .. }));
}

#[test]
fn invalid_config_creates_no_generator() {
    let result = SiqGenerator::with_time(GeneratorConfig::default().with_shard(300), MockTime { now: secs(T0) });
    assert!(matches!(result, Err(Error::Configuration(_))));
}

// Cache

#[test]
fn cache_serves_one_batch_in_order() {
    let time = SharedMockTime::at(secs(T0));
    let generator = SiqGenerator::with_time(GeneratorConfig::default(), time).unwrap();
    let mut cache = SiqCache::new(&generator, SiqType::Thread).with_size(4);
    assert!(cache.is_empty());

    let first = cache.next_id().unwrap();
    assert_eq!(cache.len(), 3);
    let rest: Vec<_> = (0..3).map(|_| cache.next_id().unwrap()).collect();
    assert!(cache.is_empty());

    assert_eq!(first.serial(QualifierProfile::Compact), 0);
    assert_eq!(rest.last().unwrap().serial(QualifierProfile::Compact), 3);
    assert!(first < rest[0] && rest.windows(2).all(|w| w[0] < w[1]));
    assert!(rest.iter().all(|id| id.siq_type(QualifierProfile::Compact) == Some(SiqType::Thread)));

    // the generator moved past the whole batch
    let direct = generator.next_id(SiqType::Thread).unwrap();
    assert_eq!(direct.serial(QualifierProfile::Compact), 4);

    let refilled = cache.next_id().unwrap();
    assert_eq!(refilled.serial(QualifierProfile::Compact), 5);
    assert_eq!(cache.len(), 3);
}

#[test]
fn cache_discards_stale_batch() {
    let time = SharedMockTime::at(secs(T0));
    let generator = SiqGenerator::with_time(GeneratorConfig::default(), time.clone()).unwrap();
    let mut cache = SiqCache::new(&generator, SiqType::Content).with_size(8);

    let first = cache.next_id().unwrap();
    assert_eq!(cache.len(), 7);

    // exactly max_age later the batch is still served
    time.set(secs(T0) + Timestamp::ticks_to_duration(SiqCache::<SharedMockTime>::DEFAULT_MAX_AGE));
    let second = cache.next_id().unwrap();
    assert_eq!(second.tick(), first.tick());
    assert_eq!(cache.len(), 6);

    time.set(secs(T0 + 1));
    let fresh = cache.next_id().unwrap();
    assert_eq!(fresh.tick(), tick_of(secs(T0 + 1)));
    assert_eq!(fresh.serial(QualifierProfile::Compact), 0);
    assert_eq!(cache.len(), 7);
    assert!(fresh > second);
}

#[test]
fn cache_max_age_is_configurable() {
    let time = SharedMockTime::at(secs(T0));
    let generator = SiqGenerator::with_time(GeneratorConfig::default(), time.clone()).unwrap();
    let mut cache = SiqCache::new(&generator, SiqType::Account)
        .with_size(0)
        .with_max_age(Duration::from_secs(10));

    cache.next_id().unwrap();
    // a zero batch size still mints one id at a time
    assert!(cache.is_empty());

    let mut cache = SiqCache::new(&generator, SiqType::Account)
        .with_size(4)
        .with_max_age(Duration::from_secs(10));
    let first = cache.next_id().unwrap();
    time.set(secs(T0 + 5));
    assert_eq!(cache.next_id().unwrap().tick(), first.tick());

    cache.clear();
    assert_eq!(cache.next_id().unwrap().tick(), tick_of(secs(T0 + 5)));
}

#[test]
fn cache_refill_errors_propagate() {
    let time = SharedMockTime::at(secs(T0));
    let generator = SiqGenerator::with_time(
        GeneratorConfig::default().with_regression_policy(RegressionPolicy::FailFast),
        time.clone(),
    )
    .unwrap();
    generator.next_id(SiqType::Content).unwrap();

    time.set(secs(T0 - 1));
    let mut cache = SiqCache::new(&generator, SiqType::Content);
    assert!(matches!(cache.next_id(), Err(Error::ClockRegression { .. })));
    assert!(cache.is_empty());
}

// Snowflake

fn snowflake_config() -> SnowflakeConfig {
    SnowflakeConfig::new(TWITTER_EPOCH).with_worker(1).with_shard(2)
}

fn at_millis(millis: u64) -> Duration {
    TWITTER_EPOCH + Duration::from_millis(millis)
}

fn run_serial_increments_within_same_millisecond<G: SnowflakeGenerator>(generator: &G) {
    let a = generator.try_poll_id().unwrap().unwrap_ready();
    let b = generator.try_poll_id().unwrap().unwrap_ready();
    let c = generator.try_poll_id().unwrap().unwrap_ready();

    assert_eq!([a.timestamp(), b.timestamp(), c.timestamp()], [42, 42, 42]);
    assert_eq!([a.serial(), b.serial(), c.serial()], [0, 1, 2]);
    assert_eq!((a.worker(), a.shard()), (1, 2));
    assert!(a < b && b < c);
}

fn run_rollover<G: SnowflakeGenerator>(generator: &G, time: &SharedMockTime) {
    for expected in 0..=4095 {
        let id = generator.try_poll_id().unwrap().unwrap_ready();
        assert_eq!(id.serial(), expected);
        assert_eq!(id.timestamp(), 42);
    }

    let (yield_for, stall) = generator.try_poll_id().unwrap().unwrap_pending();
    assert_eq!(yield_for, Duration::from_millis(1));
    assert_eq!(stall, Stall::SerialExhausted { tick: 42 });

    time.set(at_millis(43));
    let id = generator.try_poll_id().unwrap().unwrap_ready();
    assert_eq!(id.timestamp(), 43);
    assert_eq!(id.serial(), 0);
}

fn run_clock_behind<G: SnowflakeGenerator>(generator: &G, time: &SharedMockTime) {
    generator.try_poll_id().unwrap().unwrap_ready();
    time.set(at_millis(40));
    let (yield_for, stall) = generator.try_poll_id().unwrap().unwrap_pending();
    assert_eq!(yield_for, Duration::from_millis(2));
    assert_eq!(stall, Stall::ClockBehind { now: 40, last: 42 });
}

fn run_unique_across_threads<G: SnowflakeGenerator + Sync>(generator: &G) {
    const THREADS: usize = 8;
    const IDS_PER_THREAD: usize = 4096 * 4;

    let seen: Mutex<HashSet<SnowflakeId>> = Mutex::new(HashSet::with_capacity(THREADS * IDS_PER_THREAD));
    scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                for _ in 0..IDS_PER_THREAD {
                    let id = generator.next_id().unwrap();
                    assert!(seen.lock().unwrap().insert(id));
                }
            });
        }
    });
    assert_eq!(seen.lock().unwrap().len(), THREADS * IDS_PER_THREAD);
}

#[test]
fn lock_snowflake_serial_increments() {
    let generator =
        LockSnowflakeGenerator::with_time(&snowflake_config(), MockTime { now: at_millis(42) }).unwrap();
    run_serial_increments_within_same_millisecond(&generator);
}

#[test]
fn atomic_snowflake_serial_increments() {
    let generator =
        AtomicSnowflakeGenerator::with_time(&snowflake_config(), MockTime { now: at_millis(42) }).unwrap();
    run_serial_increments_within_same_millisecond(&generator);
}

#[test]
fn lock_snowflake_rollover() {
    let time = SharedMockTime::at(at_millis(42));
    let generator = LockSnowflakeGenerator::with_time(&snowflake_config(), time.clone()).unwrap();
    run_rollover(&generator, &time);
}

#[test]
fn atomic_snowflake_rollover() {
    let time = SharedMockTime::at(at_millis(42));
    let generator = AtomicSnowflakeGenerator::with_time(&snowflake_config(), time.clone()).unwrap();
    run_rollover(&generator, &time);
}

#[test]
fn lock_snowflake_clock_behind() {
    let time = SharedMockTime::at(at_millis(42));
    let generator = LockSnowflakeGenerator::with_time(&snowflake_config(), time.clone()).unwrap();
    run_clock_behind(&generator, &time);
}

#[test]
fn atomic_snowflake_clock_behind() {
    let time = SharedMockTime::at(at_millis(42));
    let generator = AtomicSnowflakeGenerator::with_time(&snowflake_config(), time.clone()).unwrap();
    run_clock_behind(&generator, &time);
}

#[test]
fn snowflake_fail_fast() {
    let time = SharedMockTime::at(at_millis(42));
    let config = snowflake_config().with_regression_policy(RegressionPolicy::FailFast);
    let generator = AtomicSnowflakeGenerator::with_time(&config, time.clone()).unwrap();
    generator.next_id().unwrap();
    time.set(at_millis(41));
    assert_eq!(
        generator.next_id().unwrap_err(),
        Error::ClockRegression { now: 41, last: 42 }
    );
}

#[test]
fn snowflake_resume_after() {
    let last = SnowflakeId::from_components(42, 1, 2, 99).unwrap();
    let time = MockTime { now: at_millis(42) };
    let lock = LockSnowflakeGenerator::with_time(&snowflake_config(), time)
        .unwrap()
        .resume_after(last);
    assert_eq!(lock.next_id().unwrap().serial(), 100);

    let time = MockTime { now: at_millis(42) };
    let atomic = AtomicSnowflakeGenerator::with_time(&snowflake_config(), time)
        .unwrap()
        .resume_after(last);
    assert_eq!(atomic.next_id().unwrap().serial(), 100);
}

#[test]
fn lock_snowflake_unique_across_threads() {
    let generator =
        LockSnowflakeGenerator::with_time(&snowflake_config(), MonotonicClock::new()).unwrap();
    run_unique_across_threads(&generator);
}

#[test]
fn atomic_snowflake_unique_across_threads() {
    let generator =
        AtomicSnowflakeGenerator::with_time(&snowflake_config(), MonotonicClock::new()).unwrap();
    run_unique_across_threads(&generator);
}

#[test]
fn lock_snowflake_fail_fast_under_contention() {
    let config = snowflake_config().with_regression_policy(RegressionPolicy::FailFast);
    let generator = LockSnowflakeGenerator::with_time(&config, MonotonicClock::new()).unwrap();
    run_fail_fast_across_threads(&generator, |g| g.next_id().map(drop));
}

#[test]
fn atomic_snowflake_fail_fast_under_contention() {
    let config = snowflake_config().with_regression_policy(RegressionPolicy::FailFast);
    let generator = AtomicSnowflakeGenerator::with_time(&config, MonotonicClock::new()).unwrap();
    run_fail_fast_across_threads(&generator, |g| g.next_id().map(drop));
}

#[test]
fn atomic_snowflake_rereads_clock_before_failing() {
    // the first reading is stale, the second has caught up with the stored tick
    let config = snowflake_config().with_regression_policy(RegressionPolicy::FailFast);
    let time = AdvanceAfter {
        before: at_millis(41),
        after: at_millis(42),
        reads: 2,
        count: Cell::new(0),
    };
    let last = SnowflakeId::from_components(42, 1, 2, 7).unwrap();
    let generator = AtomicSnowflakeGenerator::with_time(&config, time)
        .unwrap()
        .resume_after(last);
    let id = generator.try_poll_id().unwrap().unwrap_ready();
    assert_eq!((id.timestamp(), id.serial()), (42, 8));
}

#[cfg(feature = "tracing")]
#[test]
fn regression_and_exhaustion_are_logged() {
    use std::{io, sync::Arc};

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_writer(move || writer.clone())
        .finish();

    tracing::subscriber::with_default(subscriber, || {
        let time = SharedMockTime::at(secs(T0));
        let generator = SiqGenerator::with_time(
            GeneratorConfig::default()
                .with_shard(1)
                .with_max_wait(Duration::from_millis(1)),
            time.clone(),
        )
        .unwrap();

        generator.next_id(SiqType::Content).unwrap();
        time.set(secs(T0 - 1));
        assert!(generator.next_id(SiqType::Content).is_err());

        time.set(secs(T0));
        while generator.next_id(SiqType::Content).is_ok() {}
    });

    let output = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
    assert!(output.contains("resolved generator settings"), "{output}");
    // each blocking call that stalled logs its stall once, however many polls it took
    assert_eq!(output.matches("clock moved backwards").count(), 1, "{output}");
    assert_eq!(output.matches("serial space exhausted").count(), 1, "{output}");
}
