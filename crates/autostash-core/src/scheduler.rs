//! Fixed-cadence tick loop.
//!
//! The scheduler alternates between [`State::Idle`], sleeping in bounded
//! slices until `next_due`, and [`State::Running`], walking the tracklist in
//! order. After every tick `next_due` moves forward by whole intervals until
//! it is past the completion time, so a slow tick skips the slots it
//! overran instead of firing a backlog of immediate runs.

use crate::config::MAX_INTERVAL_SECS;
use crate::error::{Result, StashError};
use crate::job::RepoJob;
use crate::outcome::{Outcome, Tick};
use chrono::{DateTime, Local};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Upper bound on one idle sleep so cancellation is noticed promptly.
pub const MAX_SLEEP_SLICE: Duration = Duration::from_millis(250);

// ---------------------------------------------------------------------------
// Time and cancellation
// ---------------------------------------------------------------------------

pub trait Clock {
    fn now(&self) -> DateTime<Local>;
    fn sleep(&self, duration: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }

    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Shared stop flag, set from a signal handler and polled by the loop.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// ---------------------------------------------------------------------------
// Drift correction
// ---------------------------------------------------------------------------

/// Next due time after a tick that was scheduled for `due` and finished at
/// `now`: the first `due + k * interval` (k ≥ 1) strictly after `now`.
/// `None` once the result leaves chrono's representable range.
pub fn advance_due(
    due: DateTime<Local>,
    interval: chrono::Duration,
    now: DateTime<Local>,
) -> Option<DateTime<Local>> {
    let mut next = due.checked_add_signed(interval)?;
    while next <= now {
        next = next.checked_add_signed(interval)?;
    }
    Some(next)
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
}

pub struct Scheduler<C, J> {
    repos: Vec<PathBuf>,
    interval: chrono::Duration,
    clock: C,
    job: J,
    cancel: CancelToken,
    state: State,
    next_due: DateTime<Local>,
    runs: u64,
}

impl<C: Clock, J: RepoJob> Scheduler<C, J> {
    /// The first tick is due immediately.
    pub fn new(
        repos: Vec<PathBuf>,
        interval: Duration,
        clock: C,
        job: J,
        cancel: CancelToken,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(StashError::InvalidConfig(
                "interval must be at least one second".to_string(),
            ));
        }
        if interval.as_secs() > MAX_INTERVAL_SECS {
            return Err(StashError::InvalidConfig(format!(
                "interval must be at most {MAX_INTERVAL_SECS} seconds"
            )));
        }
        let interval = chrono::Duration::from_std(interval)
            .map_err(|e| StashError::InvalidConfig(format!("interval out of range: {e}")))?;
        let next_due = clock.now();
        Ok(Self {
            repos,
            interval,
            clock,
            job,
            cancel,
            state: State::Idle,
            next_due,
            runs: 0,
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn next_due(&self) -> DateTime<Local> {
        self.next_due
    }

    pub fn repos(&self) -> &[PathBuf] {
        &self.repos
    }

    /// Tick until cancelled, handing each finished tick to `on_tick`.
    pub fn run<F>(&mut self, mut on_tick: F)
    where
        F: FnMut(&Tick),
    {
        while self.wait_until_due() {
            let tick = self.run_tick();
            on_tick(&tick);
            if self.cancel.is_cancelled() {
                break;
            }
        }
        tracing::info!(runs = self.runs, "scheduler stopped");
    }

    /// Run a single tick with no follow-up scheduled.
    pub fn run_once(&mut self) -> Tick {
        let mut tick = self.run_tick();
        tick.next_run = None;
        tick
    }

    /// Idle until `next_due`. Returns `false` if cancelled while waiting.
    pub fn wait_until_due(&mut self) -> bool {
        self.state = State::Idle;
        loop {
            if self.cancel.is_cancelled() {
                return false;
            }
            let now = self.clock.now();
            if now >= self.next_due {
                return true;
            }
            let remaining = (self.next_due - now).to_std().unwrap_or(Duration::ZERO);
            self.clock.sleep(remaining.min(MAX_SLEEP_SLICE));
        }
    }

    /// Process every repository once, in tracklist order, then advance the
    /// schedule. Cancellation is honoured between repositories.
    pub fn run_tick(&mut self) -> Tick {
        self.state = State::Running;
        let started_at = self.clock.now();
        let mut outcomes = Vec::with_capacity(self.repos.len());

        let repos = &self.repos;
        let job = &self.job;
        let cancel = &self.cancel;
        let result = catch_unwind(AssertUnwindSafe(|| {
            for repo in repos {
                if cancel.is_cancelled() {
                    break;
                }
                outcomes.push(job.run(repo));
            }
        }));
        if let Err(payload) = result {
            let detail = panic_message(payload.as_ref());
            tracing::warn!("tick aborted: {detail}");
            outcomes.push(Outcome::run_level(detail));
        }

        let finished_at = self.clock.now();
        let next_run = match advance_due(self.next_due, self.interval, finished_at) {
            Some(next) => {
                self.next_due = next;
                Some(next)
            }
            None => {
                tracing::warn!("next run time is out of range, stopping");
                outcomes.push(Outcome::run_level("next run time is out of range".to_string()));
                self.cancel.cancel();
                None
            }
        };
        self.runs += 1;
        self.state = State::Idle;

        Tick {
            index: self.runs,
            started_at,
            duration: (finished_at - started_at).to_std().unwrap_or(Duration::ZERO),
            next_run,
            outcomes,
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "tick panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::Status;
    use chrono::TimeZone;
    use std::cell::{Cell, RefCell};
    use std::path::Path;
    use std::rc::Rc;

    #[derive(Clone)]
    struct FakeClock {
        now: Rc<Cell<DateTime<Local>>>,
        sleeps: Rc<RefCell<Vec<Duration>>>,
    }

    impl FakeClock {
        fn at(start: DateTime<Local>) -> Self {
            Self {
                now: Rc::new(Cell::new(start)),
                sleeps: Rc::new(RefCell::new(Vec::new())),
            }
        }

        fn advance(&self, d: Duration) {
            self.now
                .set(self.now.get() + chrono::Duration::from_std(d).unwrap());
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> DateTime<Local> {
            self.now.get()
        }

        fn sleep(&self, duration: Duration) {
            self.sleeps.borrow_mut().push(duration);
            self.advance(duration);
        }
    }

    /// Takes `cost` of fake time per repository and records start times.
    struct TimedJob {
        clock: FakeClock,
        cost: Duration,
        seen: RefCell<Vec<(PathBuf, DateTime<Local>)>>,
    }

    impl RepoJob for TimedJob {
        fn run(&self, repo: &Path) -> Outcome {
            self.seen
                .borrow_mut()
                .push((repo.to_path_buf(), self.clock.now()));
            self.clock.advance(self.cost);
            Outcome::no_changes(repo)
        }
    }

    fn t0() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 1, 5, 8, 0, 0).unwrap()
    }

    fn scheduler(cost: Duration, repos: &[&str]) -> (Scheduler<FakeClock, TimedJob>, FakeClock) {
        let clock = FakeClock::at(t0());
        let job = TimedJob {
            clock: clock.clone(),
            cost,
            seen: RefCell::new(Vec::new()),
        };
        let repos = repos.iter().map(PathBuf::from).collect();
        let s = Scheduler::new(
            repos,
            Duration::from_secs(20),
            clock.clone(),
            job,
            CancelToken::new(),
        )
        .unwrap();
        (s, clock)
    }

    #[test]
    fn advance_due_keeps_fixed_cadence() {
        let interval = chrono::Duration::seconds(20);
        let due = t0();
        assert_eq!(
            advance_due(due, interval, due + chrono::Duration::seconds(3)),
            Some(due + chrono::Duration::seconds(20))
        );
        assert_eq!(
            advance_due(due, interval, due + chrono::Duration::seconds(45)),
            Some(due + chrono::Duration::seconds(60))
        );
        assert_eq!(
            advance_due(due, interval, due + chrono::Duration::seconds(40)),
            Some(due + chrono::Duration::seconds(60))
        );
    }

    #[test]
    fn advance_due_out_of_range_is_none() {
        let huge = chrono::Duration::days(365 * 1_000_000);
        assert_eq!(advance_due(t0(), huge, t0()), None);
    }

    #[test]
    fn first_tick_is_due_immediately() {
        let (mut s, clock) = scheduler(Duration::from_secs(1), &["/a"]);
        assert_eq!(s.next_due(), t0());
        assert!(s.wait_until_due());
        assert!(clock.sleeps.borrow().is_empty());
        assert_eq!(s.state(), State::Idle);
    }

    #[test]
    fn slow_tick_skips_missed_slots() {
        let (mut s, clock) = scheduler(Duration::from_secs(45), &["/a"]);
        let tick = s.run_tick();
        let now = clock.now();
        assert_eq!(now, t0() + chrono::Duration::seconds(45));
        assert!(s.next_due() > now);
        let offset = (s.next_due() - t0()).num_seconds();
        assert_eq!(offset % 20, 0);
        assert_eq!(offset, 60);
        assert_eq!(tick.duration, Duration::from_secs(45));
        assert_eq!(tick.next_run, Some(s.next_due()));
    }

    #[test]
    fn fast_ticks_fire_on_the_grid() {
        let (mut s, _clock) = scheduler(Duration::from_secs(3), &["/a", "/b"]);
        let cancel = s.cancel.clone();
        let mut ticks = Vec::new();
        s.run(|tick| {
            ticks.push(tick.clone());
            if ticks.len() == 3 {
                cancel.cancel();
            }
        });

        let starts: Vec<i64> = ticks
            .iter()
            .map(|t| (t.started_at - t0()).num_seconds())
            .collect();
        assert_eq!(starts, vec![0, 20, 40]);
        assert_eq!(ticks[2].index, 3);
        for t in &ticks {
            assert_eq!(t.outcomes.len(), 2);
            assert_eq!(t.outcomes[0].repo, "/a");
            assert_eq!(t.outcomes[1].repo, "/b");
        }
    }

    #[test]
    fn idle_sleep_is_sliced() {
        let (mut s, clock) = scheduler(Duration::from_secs(1), &["/a"]);
        s.run_tick();
        assert!(s.wait_until_due());
        let sleeps = clock.sleeps.borrow();
        assert!(sleeps.iter().all(|d| *d <= MAX_SLEEP_SLICE));
        assert_eq!(clock.now(), t0() + chrono::Duration::seconds(20));
    }

    #[test]
    fn cancelled_wait_returns_false() {
        let (mut s, _clock) = scheduler(Duration::from_secs(1), &["/a"]);
        s.run_tick();
        s.cancel.cancel();
        assert!(!s.wait_until_due());
    }

    #[test]
    fn cancel_mid_tick_stops_between_repos() {
        struct CancellingJob(CancelToken);
        impl RepoJob for CancellingJob {
            fn run(&self, repo: &Path) -> Outcome {
                self.0.cancel();
                Outcome::no_changes(repo)
            }
        }
        let cancel = CancelToken::new();
        let mut s = Scheduler::new(
            vec![PathBuf::from("/a"), PathBuf::from("/b")],
            Duration::from_secs(20),
            FakeClock::at(t0()),
            CancellingJob(cancel.clone()),
            cancel,
        )
        .unwrap();
        let mut ticks = 0;
        s.run(|tick| {
            ticks += 1;
            assert_eq!(tick.outcomes.len(), 1);
        });
        assert_eq!(ticks, 1);
    }

    #[test]
    fn panicking_job_becomes_run_level_error() {
        struct FlakyJob;
        impl RepoJob for FlakyJob {
            fn run(&self, repo: &Path) -> Outcome {
                if repo == Path::new("/b") {
                    panic!("tracklist entry vanished");
                }
                Outcome::no_changes(repo)
            }
        }
        let mut s = Scheduler::new(
            vec![PathBuf::from("/a"), PathBuf::from("/b"), PathBuf::from("/c")],
            Duration::from_secs(20),
            FakeClock::at(t0()),
            FlakyJob,
            CancelToken::new(),
        )
        .unwrap();
        let tick = s.run_tick();
        assert_eq!(tick.outcomes.len(), 2);
        assert_eq!(tick.outcomes[1].repo, crate::outcome::RUN_LEVEL_REPO);
        assert_eq!(tick.outcomes[1].status(), Status::Error);
        assert_eq!(tick.outcomes[1].detail(), Some("tracklist entry vanished"));
        assert_eq!(s.next_due(), t0() + chrono::Duration::seconds(20));
    }

    #[test]
    fn run_once_has_no_next_run() {
        let (mut s, _clock) = scheduler(Duration::from_secs(1), &["/a"]);
        let tick = s.run_once();
        assert_eq!(tick.next_run, None);
        assert_eq!(tick.index, 1);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let result = Scheduler::new(
            vec![],
            Duration::ZERO,
            FakeClock::at(t0()),
            TimedJob {
                clock: FakeClock::at(t0()),
                cost: Duration::ZERO,
                seen: RefCell::new(Vec::new()),
            },
            CancelToken::new(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn interval_beyond_one_day_is_rejected() {
        let make = |secs: u64| {
            Scheduler::new(
                vec![PathBuf::from("/a")],
                Duration::from_secs(secs),
                FakeClock::at(t0()),
                TimedJob {
                    clock: FakeClock::at(t0()),
                    cost: Duration::ZERO,
                    seen: RefCell::new(Vec::new()),
                },
                CancelToken::new(),
            )
        };
        assert!(make(MAX_INTERVAL_SECS).is_ok());
        assert!(matches!(
            make(MAX_INTERVAL_SECS + 1),
            Err(StashError::InvalidConfig(_))
        ));
        assert!(matches!(
            make(10_000_000_000_000),
            Err(StashError::InvalidConfig(_))
        ));
    }

    #[test]
    fn longest_interval_schedules_without_overflow() {
        let clock = FakeClock::at(t0());
        let job = TimedJob {
            clock: clock.clone(),
            cost: Duration::from_secs(1),
            seen: RefCell::new(Vec::new()),
        };
        let mut s = Scheduler::new(
            vec![PathBuf::from("/a")],
            Duration::from_secs(MAX_INTERVAL_SECS),
            clock,
            job,
            CancelToken::new(),
        )
        .unwrap();
        let tick = s.run_tick();
        assert_eq!(tick.outcomes.len(), 1);
        assert_eq!(
            tick.next_run,
            Some(t0() + chrono::Duration::seconds(MAX_INTERVAL_SECS as i64))
        );
    }
}
