use tracing::debug;

use crate::context::AppContext;
use crate::session::{AnalysisSource, Screen};
use crate::state::lock;

pub fn current_screen(ctx: &AppContext) -> Screen {
    lock(&ctx.state).session().screen()
}

/// Go to `screen`.  Opening the analysis screen goes through
/// [`super::analysis::open_analysis`] so a payload can be passed.
pub fn navigate(ctx: &AppContext, screen: Screen) {
    if screen.is_placeholder() {
        debug!(%screen, "opening placeholder screen");
    }
    lock(&ctx.state).navigate(screen, None::<AnalysisSource>);
}

pub fn back(ctx: &AppContext) {
    lock(&ctx.state).back();
}
