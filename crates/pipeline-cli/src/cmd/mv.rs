use crate::cmd::Backend;
use crate::output::{print_json, Console};
use anyhow::{bail, Context};
use pipeline_core::catalog::catalog;
use pipeline_core::config::Config;
use pipeline_core::drag::{CardTargetPolicy, DropTarget};
use pipeline_core::reconcile::Settlement;
use pipeline_core::session::BoardSession;
use pipeline_core::types::Taxonomy;
use std::path::Path;

pub struct MoveArgs<'a> {
    pub id: &'a str,
    pub target: &'a str,
    pub taxonomy: Taxonomy,
    /// `target` names another card rather than a stage.
    pub onto_card: bool,
}

/// Run one drag transaction against the board: pick up `id`, drop it on
/// `target`, and reconcile with the backend.
pub fn run(root: &Path, server: Option<&str>, args: MoveArgs<'_>, json: bool) -> anyhow::Result<()> {
    let MoveArgs {
        id,
        target,
        taxonomy,
        onto_card,
    } = args;
    let config = Config::load_or_default(root).context("failed to load config")?;
    let card_target = config.board(taxonomy).card_target;
    let mut session = BoardSession::open(taxonomy, &config, Backend::select(root, server), Console)
        .context("failed to load opportunities")?;

    session.begin_drag(id)?;
    let from = session.board().partition().stage_of(id).unwrap_or_default();
    session.hover(target)?;
    let drop_target = if onto_card {
        DropTarget::Card(target.to_string())
    } else {
        DropTarget::Stage(target.to_string())
    };
    let card_known = session.board().find(target).is_some();
    let settlement = session.drop(&drop_target)?;

    let Some(settlement) = settlement else {
        let discard = Discard {
            id,
            target,
            from,
            taxonomy,
            onto_card,
            card_known,
            card_target,
        };
        return discard.report(json);
    };

    let to = session.board().find(id).map(|r| r.stage_id(taxonomy));
    match settlement {
        Settlement::Confirmed => {
            let to = to.unwrap_or_default();
            if json {
                print_json(&serde_json::json!({
                    "id": id,
                    "taxonomy": taxonomy,
                    "from": from,
                    "to": to,
                    "changed": true,
                }))?;
            } else {
                let label = catalog(taxonomy).label_of(to).unwrap_or(to);
                println!("Moved {id} to {label}");
            }
            Ok(())
        }
        Settlement::Repaired => bail!("stage update for '{id}' was not accepted"),
        Settlement::Stale => bail!("stage update for '{id}' failed and the board could not be reloaded"),
    }
}

struct Discard<'a> {
    id: &'a str,
    target: &'a str,
    from: &'static str,
    taxonomy: Taxonomy,
    onto_card: bool,
    card_known: bool,
    card_target: CardTargetPolicy,
}

impl Discard<'_> {
    /// Explain a drop that moved nothing. Drops that could never succeed are
    /// errors; a drop back into the current column is a no-op.
    fn report(&self, json: bool) -> anyhow::Result<()> {
        let Self {
            id,
            target,
            from,
            taxonomy,
            ..
        } = *self;
        let cat = catalog(taxonomy);
        if !self.onto_card && !cat.contains(target) {
            let expected: Vec<&str> = cat.ids().collect();
            bail!(
                "'{target}' is not a {taxonomy} stage (expected one of: {})",
                expected.join(", ")
            );
        }
        if self.onto_card && target != id {
            if self.card_target == CardTargetPolicy::Ignore {
                bail!("the {taxonomy} board ignores drops onto other cards; name a stage instead");
            }
            if !self.card_known {
                bail!("no opportunity '{target}' on the {taxonomy} board");
            }
        }

        if json {
            print_json(&serde_json::json!({
                "id": id,
                "taxonomy": taxonomy,
                "from": from,
                "to": from,
                "changed": false,
            }))?;
        } else {
            println!("{id} is already in {}", cat.label_of(from).unwrap_or(from));
        }
        Ok(())
    }
}
