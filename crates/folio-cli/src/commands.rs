//! Subcommand implementations.
//!
//! Each command runs against any [`FactStore`] and writes its report to
//! `out`, so tests drive them with an in-memory store and a byte buffer.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result, bail};

use folio_blocks::{AffectedBlock, Block, BlockOps, MemoryUiState, NumberingConfig, UiState, build_tree};
use folio_store::FactStore;
use folio_types::{EntityId, Fact};

pub async fn init(store: &impl FactStore, out: &mut impl Write) -> Result<()> {
    store.set_initialized().await?;
    writeln!(out, "initialized")?;
    Ok(())
}

/// Load a JSON array of facts and mark the store initialized.
pub async fn import(store: &impl FactStore, file: &Path, out: &mut impl Write) -> Result<()> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("reading {}", file.display()))?;
    let facts: Vec<Fact> = serde_json::from_str(&text)
        .with_context(|| format!("parsing facts from {}", file.display()))?;
    let count = facts.len();
    for fact in facts {
        let id = fact.id;
        store
            .put_fact(fact)
            .await
            .with_context(|| format!("importing fact {id}"))?;
    }
    store.set_initialized().await?;
    tracing::info!(count, file = %file.display(), "imported facts");
    writeln!(out, "imported {count} facts")?;
    Ok(())
}

pub async fn export(store: &impl FactStore, out: &mut impl Write) -> Result<()> {
    let facts = store.all_facts().await?;
    serde_json::to_writer_pretty(&mut *out, &facts)?;
    writeln!(out)?;
    Ok(())
}

/// Print the flattened block sequence, indented by list depth.
pub async fn tree(store: &impl FactStore, container: EntityId, out: &mut impl Write) -> Result<()> {
    let Some(blocks) = build_tree(store, container).await? else {
        writeln!(out, "store not initialized")?;
        return Ok(());
    };
    for block in &blocks {
        writeln!(out, "{}", render(block))?;
    }
    Ok(())
}

fn render(block: &Block) -> String {
    match &block.list_data {
        None => format!("{}  [{}]", block.value, block.block_type),
        Some(list) => {
            let indent = "  ".repeat(list.depth.saturating_sub(1) as usize);
            let marker = if list.is_ordered() {
                format!("{}.", list.list_number.unwrap_or(0))
            } else if list.checklist {
                "[ ]".to_string()
            } else {
                "-".to_string()
            };
            format!("{indent}{marker} {}  [{}]", block.value, block.block_type)
        }
    }
}

/// Renumber `depths` under `container`, or every list depth if none given.
pub async fn renumber(
    store: &impl FactStore,
    config: &NumberingConfig,
    container: EntityId,
    depths: &[u32],
    out: &mut impl Write,
) -> Result<()> {
    let Some(blocks) = build_tree(store, container).await? else {
        bail!("store not initialized");
    };
    let wanted: BTreeSet<u32> = if depths.is_empty() {
        blocks.iter().filter_map(Block::depth).collect()
    } else {
        depths.iter().copied().collect()
    };
    let affected: Vec<AffectedBlock> = wanted
        .into_iter()
        .filter_map(|depth| {
            blocks
                .iter()
                .find(|b| b.depth() == Some(depth))
                .map(|b| AffectedBlock::new(b.value, depth))
        })
        .collect();

    let ui = MemoryUiState::new();
    let ops = BlockOps::new(store, &ui).with_config(config.clone());
    let result = ops.renumber(container, &affected).await?;
    tracing::info!(%container, written = result.written.len(), "renumbered");
    writeln!(
        out,
        "{} numbered, {} rewritten",
        result.assigned.len(),
        result.written.len()
    )?;
    Ok(())
}

/// Structural edits that act on one block and the block before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Restructure {
    Indent,
    Outdent,
    OutdentFull,
}

pub async fn restructure(
    store: &impl FactStore,
    config: &NumberingConfig,
    kind: Restructure,
    container: EntityId,
    entity: EntityId,
    out: &mut impl Write,
) -> Result<()> {
    let blocks = load_blocks(store, container).await?;
    let index = locate(&blocks, container, entity)?;
    let block = &blocks[index];
    let previous = index.checked_sub(1).map(|i| &blocks[i]);

    let ui = MemoryUiState::new();
    let ops = BlockOps::new(store, &ui).with_config(config.clone());
    let changed = match kind {
        Restructure::Indent => ops.indent(block, previous).await?,
        Restructure::Outdent => ops.outdent(block, previous, &[]).await?,
        Restructure::OutdentFull => ops.outdent_full(block).await?,
    };

    if changed {
        tracing::info!(%container, %entity, ?kind, "restructured");
        writeln!(out, "{kind:?}: done")?;
    } else {
        writeln!(out, "{kind:?}: nothing to do")?;
    }
    Ok(())
}

pub async fn delete(
    store: &impl FactStore,
    config: &NumberingConfig,
    container: EntityId,
    entities: &[EntityId],
    out: &mut impl Write,
) -> Result<()> {
    let blocks = load_blocks(store, container).await?;
    for entity in entities {
        locate(&blocks, container, *entity)?;
    }

    let ui = MemoryUiState::new();
    ui.focus_page(container);
    let ops = BlockOps::new(store, &ui).with_config(config.clone());
    let outcome = ops.delete_blocks(entities).await?;
    tracing::info!(
        %container,
        removed = outcome.removed.len(),
        renumbered = outcome.renumbered.written.len(),
        "deleted blocks"
    );
    writeln!(
        out,
        "removed {}, closed {} pages, renumbered {}",
        outcome.removed.len(),
        outcome.closed_pages.len(),
        outcome.renumbered.written.len()
    )?;
    Ok(())
}

pub async fn set_number(
    store: &impl FactStore,
    config: &NumberingConfig,
    container: EntityId,
    entity: EntityId,
    number: i64,
    out: &mut impl Write,
) -> Result<()> {
    let blocks = load_blocks(store, container).await?;
    let block = &blocks[locate(&blocks, container, entity)?];

    let ui = MemoryUiState::new();
    let ops = BlockOps::new(store, &ui).with_config(config.clone());
    if ops.set_list_number(block, number).await? {
        tracing::info!(%container, %entity, number, "set list number");
        writeln!(out, "set {entity} to {number}")?;
    } else {
        writeln!(out, "unchanged")?;
    }
    Ok(())
}

async fn load_blocks(store: &impl FactStore, container: EntityId) -> Result<Vec<Block>> {
    build_tree(store, container)
        .await?
        .context("store not initialized; run `folio init` or `folio import` first")
}

fn locate(blocks: &[Block], container: EntityId, entity: EntityId) -> Result<usize> {
    blocks
        .iter()
        .position(|b| b.value == entity)
        .with_context(|| format!("{entity} is not a block under {container}"))
}
