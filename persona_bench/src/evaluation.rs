use crate::api::BenchmarkApi;
use crate::progress::{IntervalScheduler, ProgressTimer};
use crate::state::{Dashboard, SettleGuard, StateStore};
use crate::DashboardError;

/// Run one evaluation of the current upload with the selected methods.
///
/// Refused with [`DashboardError::EvaluationInFlight`] while another attempt is
/// outstanding. The cosmetic progress ticker runs alongside the request and
/// is stopped exactly once before the outcome is recorded. Dropping the
/// future mid-flight stops the ticker and then settles the attempt as failed.
pub async fn run_evaluation<S, A, T>(store: &S, api: &A, scheduler: &T) -> Result<(), DashboardError>
where
    S: StateStore,
    A: BenchmarkApi + ?Sized,
    T: IntervalScheduler + ?Sized,
{
    let request = store.update(|s| s.begin_evaluation())?;
    let settle = SettleGuard::new(store, Dashboard::abandon_evaluation);
    let period_ms = store.read(|s| s.config().progress_tick_ms);

    let ticking = store.clone();
    let timer = ProgressTimer::start(
        scheduler,
        period_ms,
        Box::new(move || ticking.update(|s| s.tick_progress())),
    );

    let outcome = api.evaluate(&request).await;
    timer.stop();
    settle.disarm();

    match outcome {
        Ok(reply) => {
            store.update(|s| s.finish_evaluation(Ok(reply)));
            Ok(())
        }
        Err(err) => {
            store.update(|s| s.finish_evaluation(Err(&err)));
            Err(err)
        }
    }
}
