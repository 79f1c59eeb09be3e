//! The analysis screen: manual edits, farm selection, the advisory request,
//! saving to history and reading the report aloud.

use tracing::{debug, info};

use matti_advisory::{speech_script, SpeechClip};
use matti_shared::{AdvisoryResult, HistoryEntry, ReadingField, ValidationError};

use crate::context::AppContext;
use crate::error::{ClientError, Result};
use crate::location::best_effort_fix;
use crate::session::{AnalysisSession, AnalysisSource, Screen};
use crate::state::{lock, Action};

/// Open the analysis screen.  Without a source the latest live reading is
/// used, then the manual defaults.
pub fn open_analysis(ctx: &AppContext, source: Option<AnalysisSource>) -> Result<AnalysisSession> {
    let mut state = lock(&ctx.state);
    state.navigate(Screen::Analysis, source);
    state
        .session()
        .analysis()
        .cloned()
        .ok_or(ClientError::NoAnalysis)
}

pub fn current_analysis(ctx: &AppContext) -> Result<AnalysisSession> {
    lock(&ctx.state)
        .session()
        .analysis()
        .cloned()
        .ok_or(ClientError::NoAnalysis)
}

pub fn edit_reading(ctx: &AppContext, field: ReadingField, value: f64) -> Result<()> {
    lock(&ctx.state)
        .session_mut()
        .analysis_mut()?
        .edit_reading(field, value)
}

pub fn select_farm(ctx: &AppContext, farm_id: &str) -> Result<()> {
    let mut state = lock(&ctx.state);
    if state.profiles().get_farm(farm_id).is_none() {
        return Err(ClientError::NotFound {
            kind: "Farm",
            id: farm_id.to_string(),
        });
    }
    state.session_mut().analysis_mut()?.select_farm(farm_id)
}

/// Ask the advisory service about the current reading.
///
/// Rejected with [`ClientError::Busy`] while another analysis is running.
/// If the reading was edited or the screen left while waiting, the result is
/// returned but not attached to the session.
pub async fn run_analysis(ctx: &AppContext) -> Result<AdvisoryResult> {
    let (_guard, reading, language, farm) = {
        let state = lock(&ctx.state);
        let guard = state.in_flight().begin(Action::Analysis)?;
        let language = state.language();
        let analysis = state.session().analysis().ok_or(ClientError::NoAnalysis)?;
        if analysis.is_read_only() {
            return Err(ClientError::ReadOnly);
        }
        let reading = *analysis.reading();
        let farm = analysis
            .selected_farm()
            .and_then(|id| state.profiles().get_farm(id))
            .cloned();
        (guard, reading, language, farm)
    };

    let result = ctx
        .advisory
        .request_advisory(&reading, language, farm.as_ref())
        .await?;

    let mut state = lock(&ctx.state);
    match state.session_mut().analysis_mut() {
        Ok(analysis) if *analysis.reading() == reading && !analysis.is_read_only() => {
            analysis.set_advisory(result.clone());
        }
        _ => debug!("analysis session changed while waiting, advisory not attached"),
    }
    Ok(result)
}

/// Append the current analysis to history.
///
/// A best-effort location fix is taken first; failing to get one only means
/// the entry has no location.
pub async fn save_analysis(ctx: &AppContext) -> Result<HistoryEntry> {
    let (_guard, reading, advisory, farm_id) = {
        let state = lock(&ctx.state);
        let guard = state.in_flight().begin(Action::Save)?;
        let (reading, advisory, farm_id) = state
            .session()
            .analysis()
            .ok_or(ClientError::NoAnalysis)?
            .save_request()?;
        (guard, reading, advisory, farm_id)
    };

    let location = best_effort_fix(ctx.location.as_ref(), ctx.location_timeout).await;

    let mut state = lock(&ctx.state);
    let entry = state.append_history(reading, advisory, farm_id, location)?;
    if let Ok(analysis) = state.session_mut().analysis_mut() {
        if analysis.replay_of().is_none() && *analysis.reading() == reading {
            analysis.mark_saved();
        }
    }
    info!(id = %entry.id, farm = %entry.farm_id, "soil test saved");
    Ok(entry)
}

/// Synthesize the report of the current analysis.
///
/// `Ok(None)` when speech is switched off or synthesis failed.
pub async fn speak_report(ctx: &AppContext) -> Result<Option<SpeechClip>> {
    let (_guard, script, language) = {
        let state = lock(&ctx.state);
        if !state.tts_enabled() {
            debug!("speech disabled, not speaking report");
            return Ok(None);
        }
        let advisory = state
            .session()
            .analysis()
            .ok_or(ClientError::NoAnalysis)?
            .advisory()
            .ok_or(ValidationError::NoAdvisory)?;
        let language = state.language();
        let script = speech_script(advisory, language);
        let guard = state.in_flight().begin(Action::Speech)?;
        (guard, script, language)
    };

    Ok(ctx.advisory.request_speech(&script, language).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::commands::history::{list_history, replay};
    use crate::commands::profile::add_farm;
    use crate::context::testing::{harness, harness_with, Canned, SlowLocation};
    use matti_advisory::AdvisoryError;
    use matti_shared::{LandSize, Language, SensorReading, SoilHealth};

    fn add_test_farm(ctx: &AppContext) -> String {
        let farm = matti_shared::FarmProfile::new("River plot", LandSize::acres(3.0));
        let id = farm.id.clone();
        add_farm(ctx, farm).unwrap();
        id
    }

    #[tokio::test]
    async fn analysis_uses_local_health_and_model_sections() {
        let h = harness();
        let farm = add_test_farm(&h.ctx);
        open_analysis(&h.ctx, None).unwrap();
        edit_reading(&h.ctx, ReadingField::Temperature, 40.0).unwrap();

        let result = run_analysis(&h.ctx).await.unwrap();
        assert_eq!(result.soil_health, SoilHealth::NeedsImprovement);
        assert_eq!(result.crop_suggestions, "Paddy, maize.");
        assert_eq!(result.irrigation_suggestion, "Water twice a week.");

        let session = current_analysis(&h.ctx).unwrap();
        assert_eq!(session.advisory(), Some(&result));
        assert_eq!(session.selected_farm(), Some(farm.as_str()));
        assert!(session.can_save());

        let prompts = h.model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Farm Context"));
        assert!(prompts[0].contains("40.0"));
    }

    #[tokio::test]
    async fn advisory_failure_is_surfaced_and_nothing_saved() {
        let h = harness_with(
            Canned {
                fail: true,
                ..Canned::default()
            },
            Arc::new(crate::location::NoLocation),
        );
        add_test_farm(&h.ctx);
        open_analysis(&h.ctx, None).unwrap();

        assert!(matches!(
            run_analysis(&h.ctx).await,
            Err(ClientError::Advisory(AdvisoryError::EmptyResponse))
        ));
        assert!(matches!(
            save_analysis(&h.ctx).await,
            Err(ClientError::Validation(ValidationError::NoAdvisory))
        ));
        assert!(list_history(&h.ctx).is_empty());
    }

    #[tokio::test]
    async fn save_records_location_and_blocks_second_save() {
        let h = harness();
        let farm = add_test_farm(&h.ctx);
        open_analysis(&h.ctx, Some(AnalysisSource::Live(SensorReading::manual_default()))).unwrap();
        run_analysis(&h.ctx).await.unwrap();

        let entry = save_analysis(&h.ctx).await.unwrap();
        assert_eq!(entry.farm_id, farm);
        assert!(entry.location.is_some());
        assert!(current_analysis(&h.ctx).unwrap().is_saved());

        assert!(matches!(save_analysis(&h.ctx).await, Err(ClientError::ReadOnly)));
        assert_eq!(list_history(&h.ctx).len(), 1);
    }

    #[tokio::test]
    async fn save_without_location_still_succeeds() {
        let h = harness_with(Canned::default(), Arc::new(crate::location::NoLocation));
        add_test_farm(&h.ctx);
        open_analysis(&h.ctx, None).unwrap();
        run_analysis(&h.ctx).await.unwrap();

        let entry = save_analysis(&h.ctx).await.unwrap();
        assert!(entry.location.is_none());
    }

    #[tokio::test]
    async fn concurrent_save_is_busy() {
        let h = harness_with(
            Canned::default(),
            Arc::new(SlowLocation(Duration::from_millis(50))),
        );
        add_test_farm(&h.ctx);
        open_analysis(&h.ctx, None).unwrap();
        run_analysis(&h.ctx).await.unwrap();

        let (first, second) = tokio::join!(save_analysis(&h.ctx), save_analysis(&h.ctx));
        assert!(first.is_ok());
        assert!(matches!(second, Err(ClientError::Busy(Action::Save))));
        assert_eq!(list_history(&h.ctx).len(), 1);
    }

    #[tokio::test]
    async fn save_requires_a_farm() {
        let h = harness();
        open_analysis(&h.ctx, None).unwrap();
        run_analysis(&h.ctx).await.unwrap();
        assert!(matches!(
            save_analysis(&h.ctx).await,
            Err(ClientError::Validation(ValidationError::NoFarmSelected))
        ));
    }

    #[tokio::test]
    async fn replay_suppresses_save_and_analysis() {
        let h = harness();
        add_test_farm(&h.ctx);
        open_analysis(&h.ctx, None).unwrap();
        run_analysis(&h.ctx).await.unwrap();
        let saved = save_analysis(&h.ctx).await.unwrap();

        let session = replay(&h.ctx, &saved.id).unwrap();
        assert!(session.is_read_only());
        assert_eq!(session.advisory(), Some(&saved.advisory));

        assert!(matches!(save_analysis(&h.ctx).await, Err(ClientError::ReadOnly)));
        assert!(matches!(run_analysis(&h.ctx).await, Err(ClientError::ReadOnly)));
        assert!(matches!(
            edit_reading(&h.ctx, ReadingField::Ph, 5.0),
            Err(ClientError::ReadOnly)
        ));
        assert_eq!(list_history(&h.ctx).len(), 1);
    }

    #[tokio::test]
    async fn unknown_farm_cannot_be_selected() {
        let h = harness();
        open_analysis(&h.ctx, None).unwrap();
        assert!(matches!(
            select_farm(&h.ctx, "nope"),
            Err(ClientError::NotFound { kind: "Farm", .. })
        ));
    }

    #[tokio::test]
    async fn speech_respects_toggle_and_language() {
        let h = harness();
        open_analysis(&h.ctx, None).unwrap();
        run_analysis(&h.ctx).await.unwrap();

        lock(&h.ctx.state).set_language(Language::Te).unwrap();
        let clip = speak_report(&h.ctx).await.unwrap().unwrap();
        assert_eq!(clip.frame_count(), 240);
        assert_eq!(h.model.spoken.lock().unwrap()[0].1, "Puck");

        lock(&h.ctx.state).set_tts_enabled(false).unwrap();
        assert!(speak_report(&h.ctx).await.unwrap().is_none());
        assert_eq!(h.model.spoken.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn commands_outside_analysis_report_no_session() {
        let h = harness();
        assert!(matches!(
            edit_reading(&h.ctx, ReadingField::Ph, 6.0),
            Err(ClientError::NoAnalysis)
        ));
        assert!(matches!(run_analysis(&h.ctx).await, Err(ClientError::NoAnalysis)));
    }
}
