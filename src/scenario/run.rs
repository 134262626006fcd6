//! Scenario execution
//!
//! Wait delays, timeouts and fixture lifecycle are handled here rather
//! than in plugins, so every test unit gets the same semantics. Plugins
//! only implement their own assertions.

use tokio::time::sleep;

use super::Scenario;
use crate::common::{Error, Result, RuntimeErrors};
use crate::context::Context;
use crate::debug;
use crate::fixture::FixtureGuard;
use crate::reporter::Reporter;
use crate::result::RunResult;
use crate::spec::{TestUnit, Timeout};

impl Scenario {
    /// Run every test unit in order.
    ///
    /// Returns `Ok(())` when no runtime error occurred. Assertion failures
    /// are reported to `reporter` and do not make this return an error.
    pub async fn run(&self, ctx: &Context, reporter: &mut dyn Reporter) -> Result<()> {
        // Dropped on every exit path, stopping fixtures in reverse order
        let mut fixtures = FixtureGuard::new();
        for name in &self.require {
            let fixture = ctx
                .fixture(name)
                .ok_or_else(|| Error::RequiredFixtureMissing(name.clone()))?;
            fixtures.start(name, fixture);
        }

        let title = self.title();
        tracing::info!(scenario = %title, tests = self.tests.len(), "running scenario");

        let mut errs = RuntimeErrors::new();
        let mut ctx = ctx.clone();
        reporter.enter(&title);
        for unit in &self.tests {
            match run_unit(unit.as_ref(), self.timeout.as_ref(), &ctx, reporter).await {
                UnitOutcome::Completed(mut res) => {
                    // Data handed forward is visible to every later unit
                    if let Some(data) = res.data() {
                        ctx = ctx.store_prior_run(data);
                    }
                    let err = res.take_runtime_error();
                    if let Some(err) = &err {
                        tracing::warn!(test = %unit.title(), error = %err, "runtime error");
                    }
                    errs.append_if(err);
                }
                UnitOutcome::Errored(err) => {
                    tracing::warn!(test = %unit.title(), error = %err, "runtime error");
                    errs.push(err);
                }
                UnitOutcome::TimedOut => {}
                UnitOutcome::Aborted(err) => {
                    errs.push(err);
                    break;
                }
            }

            let base = unit.base();
            if let Some(wait) = &base.wait {
                if let Some(after) = wait.after_duration() {
                    debug::println(&ctx, &format!("wait: {} after", wait.after));
                    sleep(after).await;
                }
            }
        }
        reporter.leave();

        drop(fixtures);
        errs.into_result()
    }
}

/// What happened to one test unit
enum UnitOutcome {
    Completed(RunResult),
    /// The unit returned a plain error
    Errored(Error),
    /// The unit exceeded a deadline it was expected to exceed
    TimedOut,
    /// The unit exceeded its deadline unexpectedly; the scenario stops
    Aborted(Error),
}

async fn run_unit(
    unit: &dyn TestUnit,
    scenario_timeout: Option<&Timeout>,
    ctx: &Context,
    reporter: &mut dyn Reporter,
) -> UnitOutcome {
    let base = unit.base();
    let title = unit.title();

    if let Some(wait) = &base.wait {
        if let Some(before) = wait.before_duration() {
            debug::println(ctx, &format!("wait: {} before", wait.before));
            sleep(before).await;
        }
    }

    let timeout = match (&base.timeout, scenario_timeout) {
        (Some(own), _) => {
            debug::println(ctx, &format!("using timeout of {} (expected: {})", own.after, own.expected));
            Some(own)
        }
        (None, Some(inherited)) => {
            debug::println(
                ctx,
                &format!(
                    "using timeout of {} (expected: {}) [scenario default]",
                    inherited.after, inherited.expected
                ),
            );
            Some(inherited)
        }
        (None, None) => None,
    };

    let outcome = match timeout {
        Some(timeout) => {
            let unit_ctx = ctx.with_timeout(timeout.duration());
            let ran = tokio::time::timeout(timeout.duration(), unit.run(&unit_ctx, reporter)).await;
            match ran {
                Ok(Err(Error::DeadlineExceeded)) | Err(_) => {
                    if timeout.expected {
                        debug::println(ctx, &format!("timeout: {} exceeded as expected", timeout.after));
                        reporter.pass(&format!("{title} (timed out after {} as expected)", timeout.after));
                        return UnitOutcome::TimedOut;
                    }
                    let err = Error::TimeoutExceeded(timeout.after.clone());
                    reporter.fatal(&format!("{title}: {err}"));
                    return UnitOutcome::Aborted(err);
                }
                Ok(other) => other,
            }
        }
        None => unit.run(ctx, reporter).await,
    };

    match outcome {
        Ok(res) => {
            if res.failed() {
                for failure in res.failures() {
                    reporter.fail(&format!("{title}: {failure}"));
                }
            } else {
                reporter.pass(&title);
            }
            UnitOutcome::Completed(res)
        }
        Err(err) => UnitOutcome::Errored(err),
    }
}
