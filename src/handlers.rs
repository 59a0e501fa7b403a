use crate::model::OperatorId;
use crate::news::NewsService;
use anyhow::Result;
use teloxide::prelude::*;
use tracing::instrument;

/// Pull operator identity and text out of an update and hand them to the
/// dispatch table. Non-text and sender-less updates are ignored.
#[instrument(skip_all)]
pub async fn handle_update(service: &NewsService, msg: &Message) -> Result<()> {
    let user = match msg.from() {
        Some(u) => u,
        None => return Ok(()),
    };
    let text = match msg.text() {
        Some(t) => t,
        None => return Ok(()),
    };

    let operator = OperatorId(user.id.0 as i64);
    service.dispatch(operator, text).await
}
