//! Division: a rectangular region of the output holding ordered blocks.
//!
//! Geometry resolves in two phases. Phase one computes the width, measures
//! content and picks a provisional height. Phase two places the division
//! vertically, clamps its height to what remains of the viewport, places it
//! horizontally and finally reserves scrollbar cells and bounds scrolling.

use super::rect::Rect;
use super::spec::{Anchor, DivisionSpec, Height, Length, ValidSpec};
use crate::error::{JumperError, Result};
use crate::expr::{evaluate, references, substitute_references, Reference, UnitMap, UnitResolver};
use crate::terminal::{Origin, OutputBuffer};
use crate::text::{display_width, resolve_index, slice_columns, Block, Line, Overflow};
use std::collections::HashMap;

/// A geometry property named by a reference suffix, as in `{menu}height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    /// Row of the top edge.
    Top,
    /// Row just below the bottom edge.
    Bottom,
    /// Column of the left edge.
    Left,
    /// Column just right of the right edge.
    Right,
    /// Width in columns.
    Width,
    /// Height in rows.
    Height,
}

impl Property {
    /// Parse a suffix; `expr` is only used for error reporting.
    pub fn parse(name: &str, expr: &str) -> Result<Self> {
        match name {
            "top" => Ok(Self::Top),
            "bottom" => Ok(Self::Bottom),
            "left" => Ok(Self::Left),
            "right" => Ok(Self::Right),
            "width" => Ok(Self::Width),
            "height" => Ok(Self::Height),
            _ => Err(JumperError::expression(
                expr,
                format!("unknown division property \"{name}\""),
            )),
        }
    }

    /// Read the property from resolved geometry.
    pub const fn of(self, rect: Rect) -> u16 {
        match self {
            Self::Top => rect.y,
            Self::Bottom => rect.bottom(),
            Self::Left => rect.x,
            Self::Right => rect.right(),
            Self::Width => rect.width,
            Self::Height => rect.height,
        }
    }
}

/// The geometry field an expression is evaluated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Top,
    Bottom,
    Left,
    Right,
    Width,
    Height,
}

/// Everything outside a division that its geometry depends on.
#[derive(Debug, Clone, Copy)]
pub struct LayoutContext<'a> {
    /// Terminal width in columns.
    pub terminal_width: u16,
    /// Rows available below the engine's origin.
    pub available_height: u16,
    /// Resolved geometry of the divisions this one may reference.
    pub resolved: &'a HashMap<String, Rect>,
}

impl LayoutContext<'_> {
    fn basis(&self, field: Field) -> f64 {
        match field {
            Field::Top | Field::Bottom | Field::Height => f64::from(self.available_height),
            Field::Left | Field::Right | Field::Width => f64::from(self.terminal_width),
        }
    }

    fn reference(&self, reference: &Reference<'_>, field: Field, expr: &str) -> Result<f64> {
        let rect = self
            .resolved
            .get(reference.id)
            .copied()
            .ok_or_else(|| JumperError::UnknownDivision(reference.id.to_string()))?;

        let value = match reference.property {
            Some(name) => Property::parse(name, expr)?.of(rect),
            None => match field {
                Field::Top => rect.bottom(),
                Field::Bottom => self.available_height.saturating_sub(rect.y),
                Field::Left => rect.right(),
                Field::Right => self.terminal_width.saturating_sub(rect.x),
                Field::Width => rect.width,
                Field::Height => rect.height,
            },
        };
        Ok(f64::from(value))
    }

    fn evaluate(&self, length: &Length, field: Field) -> Result<f64> {
        let expr = match length {
            Length::Cells(value) => return Ok(*value),
            Length::Expr(expr) => expr.as_str(),
        };

        let flat = substitute_references(expr, |r| self.reference(r, field, expr))?;
        let units = UnitMap::percent_of(self.basis(field));
        evaluate(&flat, &UnitResolver::Map(&units)).map_err(|err| match err {
            JumperError::InvalidExpression { reason, .. } => JumperError::expression(expr, reason),
            JumperError::UnresolvedUnit { unit, .. } => JumperError::UnresolvedUnit {
                unit,
                expr: expr.to_string(),
            },
            other => other,
        })
    }
}

/// Floor a resolved value into terminal cells, clamping negatives to zero.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn cells(value: f64) -> u16 {
    if value.is_nan() || value <= 0.0 {
        0
    } else if value >= f64::from(u16::MAX) {
        u16::MAX
    } else {
        value.floor() as u16
    }
}

/// Resolved geometry of a division.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Position and size relative to the engine's origin.
    pub rect: Rect,
    /// Columns available to content (width minus a vertical scrollbar).
    pub content_width: u16,
    /// Rows available to content (height minus a horizontal scrollbar).
    pub content_height: u16,
    /// Width of the longest visual line.
    pub natural_width: usize,
    /// Total visual lines.
    pub natural_height: usize,
    /// Largest horizontal scroll offset.
    pub max_scroll_x: usize,
    /// Largest vertical scroll offset.
    pub max_scroll_y: usize,
    /// Whether a horizontal scrollbar is drawn.
    pub scrollbar_x: bool,
    /// Whether a vertical scrollbar is drawn.
    pub scrollbar_y: bool,
    measure_width: usize,
}

#[derive(Debug, Clone)]
struct Entry {
    id: String,
    block: Block,
}

/// A rectangular region of the output.
#[derive(Debug, Clone)]
pub struct Division {
    spec: DivisionSpec,
    anchors: ValidSpec,
    blocks: Vec<Entry>,
    next_block: usize,
    lines: Vec<Line>,
    block_rows: Vec<usize>,
    lines_width: Option<usize>,
    geometry: Option<Geometry>,
    scroll_x: usize,
    scroll_y: usize,
    last_render: Option<Rect>,
    /// Content was edited since lines and scroll bounds were last fitted.
    content_changed: bool,
}

impl Division {
    /// Validate `spec` and create an empty division.
    pub fn new(spec: DivisionSpec) -> Result<Self> {
        let anchors = spec.validate()?;
        Ok(Self {
            spec,
            anchors,
            blocks: Vec::new(),
            next_block: 0,
            lines: Vec::new(),
            block_rows: Vec::new(),
            lines_width: None,
            geometry: None,
            scroll_x: 0,
            scroll_y: 0,
            last_render: None,
            content_changed: false,
        })
    }

    /// The division id.
    pub fn id(&self) -> &str {
        &self.spec.id
    }

    /// The spec this division was built from.
    pub const fn spec(&self) -> &DivisionSpec {
        &self.spec
    }

    /// Draw sequencing within a render pass.
    pub const fn render_order(&self) -> i32 {
        self.spec.render_order
    }

    /// Whether the height fills the remaining viewport.
    pub fn is_fill(&self) -> bool {
        self.spec.height == Height::Fill
    }

    /// Ids this division's geometry references, deduplicated, in order.
    pub fn references(&self) -> Vec<String> {
        let mut ids: Vec<String> = Vec::new();
        for expr in self.anchors.expressions(&self.spec.height) {
            for reference in references(expr).unwrap_or_default() {
                if !ids.iter().any(|id| id == reference.id) {
                    ids.push(reference.id.to_string());
                }
            }
        }
        ids
    }

    // ---------------------------------------------------------------------
    // Blocks
    // ---------------------------------------------------------------------

    /// Add a block, returning its id.
    ///
    /// Without an id one is generated (`block-0`, `block-1`, ...). Without
    /// an index the block is appended.
    pub fn add_block(
        &mut self,
        text: impl Into<String>,
        id: Option<&str>,
        index: Option<usize>,
    ) -> Result<String> {
        let id = match id {
            Some(id) => {
                if self.position(id).is_some() {
                    return Err(JumperError::config(
                        self.id(),
                        format!("block \"{id}\" already exists"),
                    ));
                }
                id.to_string()
            }
            None => self.generate_id(),
        };

        let index = index.unwrap_or(self.blocks.len());
        if index > self.blocks.len() {
            return Err(JumperError::OutOfRange {
                index: isize::try_from(index).unwrap_or(isize::MAX),
                len: self.blocks.len(),
            });
        }

        self.blocks.insert(
            index,
            Entry {
                id: id.clone(),
                block: Block::new(text),
            },
        );
        self.lines_width = None;
        self.content_changed = true;
        Ok(id)
    }

    fn generate_id(&mut self) -> String {
        loop {
            let id = format!("block-{}", self.next_block);
            self.next_block += 1;
            if self.position(&id).is_none() {
                return id;
            }
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.blocks.iter().position(|entry| entry.id == id)
    }

    fn entry(&self, id: &str) -> Result<&Entry> {
        self.blocks
            .iter()
            .find(|entry| entry.id == id)
            .ok_or_else(|| self.unknown_block(id))
    }

    fn entry_mut(&mut self, id: &str) -> Result<&mut Entry> {
        let division = &self.spec.id;
        self.blocks
            .iter_mut()
            .find(|entry| entry.id == id)
            .ok_or_else(|| JumperError::UnknownBlock {
                division: division.clone(),
                block: id.to_string(),
            })
    }

    fn unknown_block(&self, id: &str) -> JumperError {
        JumperError::UnknownBlock {
            division: self.spec.id.clone(),
            block: id.to_string(),
        }
    }

    /// Whether a block with this id exists.
    pub fn has_block(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    /// Get a block by id.
    pub fn block(&self, id: &str) -> Result<&Block> {
        self.entry(id).map(|entry| &entry.block)
    }

    /// Id of the block at `index`; negative indexes count from the end.
    pub fn block_at(&self, index: isize) -> Result<&str> {
        let index = resolve_index(index, self.blocks.len())?;
        Ok(&self.blocks[index].id)
    }

    /// Block ids in order.
    pub fn block_ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().map(|entry| entry.id.as_str())
    }

    /// Number of blocks.
    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    /// Replace a block's text.
    pub fn set_block_text(&mut self, id: &str, text: impl Into<String>) -> Result<()> {
        self.entry_mut(id)?.block.set_text(text);
        self.lines_width = None;
        self.content_changed = true;
        Ok(())
    }

    /// Append to a block's text.
    pub fn append_to_block(&mut self, id: &str, text: &str) -> Result<()> {
        self.entry_mut(id)?.block.append(text);
        self.lines_width = None;
        self.content_changed = true;
        Ok(())
    }

    /// Remove a block and return it.
    pub fn remove_block(&mut self, id: &str) -> Result<Block> {
        let index = self.position(id).ok_or_else(|| self.unknown_block(id))?;
        self.lines_width = None;
        self.content_changed = true;
        Ok(self.blocks.remove(index).block)
    }

    /// Replace content block by block: existing blocks take the new texts in
    /// order, missing blocks are added and surplus blocks removed. Returns
    /// the ids of the remaining blocks.
    pub fn set_content<I, S>(&mut self, texts: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut count = 0;
        for text in texts {
            if let Some(entry) = self.blocks.get_mut(count) {
                entry.block.set_text(text);
            } else {
                let id = self.generate_id();
                self.blocks.push(Entry {
                    id,
                    block: Block::new(text),
                });
            }
            count += 1;
        }
        self.blocks.truncate(count);
        self.lines_width = None;
        self.content_changed = true;
        self.blocks.iter().map(|entry| entry.id.clone()).collect()
    }

    /// Remove every block and scroll back to the origin.
    pub fn clear(&mut self) {
        self.blocks.clear();
        self.next_block = 0;
        self.scroll_x = 0;
        self.scroll_y = 0;
        self.lines_width = None;
        self.content_changed = true;
    }

    /// Rows the content needs at the resolved width: every visual line plus
    /// the horizontal scrollbar row when one would be shown. `None` before
    /// the first layout.
    ///
    /// Matches the provisional height an auto-height recompute would pick,
    /// so an edit that keeps this value cannot move the division.
    pub fn content_rows(&mut self) -> Option<usize> {
        let width = usize::from(self.geometry?.rect.width);
        self.populate_lines(width);
        let wants_bar_x = self.spec.scrollbar_x.is_some() && self.natural_width_of_lines() > width;
        Some(self.lines.len() + usize::from(wants_bar_x))
    }

    // ---------------------------------------------------------------------
    // Geometry
    // ---------------------------------------------------------------------

    /// Resolved geometry.
    pub fn geometry(&self) -> Result<&Geometry> {
        self.geometry
            .as_ref()
            .ok_or_else(|| JumperError::NotComputed(self.spec.id.clone()))
    }

    /// Whether geometry has been resolved since the last invalidation.
    pub const fn is_computed(&self) -> bool {
        self.geometry.is_some()
    }

    /// Resolved rectangle relative to the origin.
    pub fn rect(&self) -> Result<Rect> {
        self.geometry().map(|g| g.rect)
    }

    /// Top row.
    pub fn top(&self) -> Result<u16> {
        self.rect().map(|r| r.y)
    }

    /// Row just below the division.
    pub fn bottom(&self) -> Result<u16> {
        self.rect().map(|r| r.bottom())
    }

    /// Left column.
    pub fn left(&self) -> Result<u16> {
        self.rect().map(|r| r.x)
    }

    /// Column just right of the division.
    pub fn right(&self) -> Result<u16> {
        self.rect().map(|r| r.right())
    }

    /// Width in columns.
    pub fn width(&self) -> Result<u16> {
        self.rect().map(|r| r.width)
    }

    /// Height in rows.
    pub fn height(&self) -> Result<u16> {
        self.rect().map(|r| r.height)
    }

    /// Width of the longest visual line.
    pub fn natural_width(&self) -> Result<usize> {
        self.geometry().map(|g| g.natural_width)
    }

    /// Total visual lines.
    pub fn natural_height(&self) -> Result<usize> {
        self.geometry().map(|g| g.natural_height)
    }

    /// Absolute footprint of the last render.
    pub const fn last_render(&self) -> Option<Rect> {
        self.last_render
    }

    /// Move the last render footprint up, after the terminal scrolled.
    pub fn shift_last_render(&mut self, rows: u16) {
        if let Some(rect) = &mut self.last_render {
            *rect = rect.shift_up(rows);
        }
    }

    /// Drop resolved geometry; the next layout recomputes from scratch.
    pub fn invalidate(&mut self) {
        self.geometry = None;
        self.lines_width = None;
    }

    /// Resolve geometry. Unless `force` is set, resolved geometry is kept.
    ///
    /// Every division this one references must be present in
    /// `ctx.resolved`.
    pub fn recompute(&mut self, force: bool, ctx: &LayoutContext<'_>) -> Result<()> {
        if !force && self.geometry.is_some() {
            return Ok(());
        }
        self.lines_width = None;

        // phase one
        let width = cells(ctx.evaluate(&self.anchors.width, Field::Width)?);
        self.populate_lines(usize::from(width));
        let natural_width = self.natural_width_of_lines();
        let wants_bar_x = self.spec.scrollbar_x.is_some() && natural_width > usize::from(width);

        let avail = f64::from(ctx.available_height);
        let auto_rows = u32::try_from(self.lines.len() + usize::from(wants_bar_x)).unwrap_or(u32::MAX);
        let provisional = match &self.spec.height {
            Height::Auto => f64::from(auto_rows),
            Height::Fixed(length) => ctx.evaluate(length, Field::Height)?,
            Height::Fill => avail,
        };
        let provisional = cells(provisional);

        // phase two
        let top = match &self.anchors.vertical {
            Anchor::Start(length) => ctx.evaluate(length, Field::Top)?,
            Anchor::End(length) => {
                avail - f64::from(provisional) - ctx.evaluate(length, Field::Bottom)?
            }
        };
        let top = cells(top);
        let height = provisional.min(ctx.available_height.saturating_sub(top));

        let left = match &self.anchors.horizontal {
            Anchor::Start(length) => ctx.evaluate(length, Field::Left)?,
            Anchor::End(length) => {
                f64::from(ctx.terminal_width) - f64::from(width) - ctx.evaluate(length, Field::Right)?
            }
        };
        let rect = Rect::new(cells(left), top, width, height);

        let geometry = self.fit_content(rect, usize::from(width));
        tracing::debug!(
            division = %self.spec.id,
            ?rect,
            lines = geometry.natural_height,
            "recomputed division"
        );
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Rebuild lines after a content edit that kept the content rows.
    /// The rectangle is kept; scroll bounds are refreshed.
    pub fn refresh_content(&mut self) -> Result<()> {
        let geometry = *self.geometry()?;
        if !self.content_changed {
            return Ok(());
        }
        let refreshed = self.fit_content(geometry.rect, geometry.measure_width);
        self.geometry = Some(refreshed);
        Ok(())
    }

    /// Measure content into `rect` and bound scrolling.
    fn fit_content(&mut self, rect: Rect, measure_width: usize) -> Geometry {
        self.content_changed = false;
        self.populate_lines(measure_width);
        let mut geometry = self.bounds(rect, measure_width);

        // A vertical scrollbar steals a column from wrapped text.
        if self.spec.overflow_x == Overflow::Wrap
            && geometry.scrollbar_y
            && usize::from(geometry.content_width) != measure_width
        {
            let narrower = usize::from(geometry.content_width);
            self.populate_lines(narrower);
            geometry = self.bounds(rect, narrower);
        }

        self.scroll_x = self.scroll_x.min(geometry.max_scroll_x);
        self.scroll_y = self.scroll_y.min(geometry.max_scroll_y);
        geometry
    }

    /// Reserve scrollbar cells and compute scroll limits. Each scrollbar
    /// that appears shrinks the other axis, so reservations only grow.
    fn bounds(&self, rect: Rect, measure_width: usize) -> Geometry {
        let natural_width = self.natural_width_of_lines();
        let natural_height = self.lines.len();
        let wants_x = self.spec.scrollbar_x.is_some();
        let wants_y = self.spec.scrollbar_y.is_some();

        let (mut bar_x, mut bar_y) = (false, false);
        loop {
            let content_width = rect.width.saturating_sub(u16::from(bar_y));
            let content_height = rect.height.saturating_sub(u16::from(bar_x));
            let max_scroll_x = match self.spec.overflow_x {
                Overflow::Scroll => natural_width.saturating_sub(usize::from(content_width)),
                Overflow::Wrap => 0,
            };
            let max_scroll_y = natural_height.saturating_sub(usize::from(content_height));

            let next_x = bar_x || (wants_x && max_scroll_x > 0);
            let next_y = bar_y || (wants_y && max_scroll_y > 0);
            if (next_x, next_y) == (bar_x, bar_y) {
                return Geometry {
                    rect,
                    content_width,
                    content_height,
                    natural_width,
                    natural_height,
                    max_scroll_x,
                    max_scroll_y,
                    scrollbar_x: bar_x,
                    scrollbar_y: bar_y,
                    measure_width,
                };
            }
            bar_x = next_x;
            bar_y = next_y;
        }
    }

    fn populate_lines(&mut self, width: usize) {
        if self.lines_width == Some(width) {
            return;
        }
        let (overflow, wrap) = (self.spec.overflow_x, self.spec.wrap_on_word);
        self.lines.clear();
        self.block_rows.clear();
        for entry in &mut self.blocks {
            self.block_rows.push(self.lines.len());
            self.lines
                .extend_from_slice(entry.block.measure(width, overflow, wrap).lines());
        }
        self.lines_width = Some(width);
    }

    fn natural_width_of_lines(&self) -> usize {
        self.lines.iter().map(|line| line.width).max().unwrap_or(0)
    }

    // ---------------------------------------------------------------------
    // Scrolling
    // ---------------------------------------------------------------------

    /// Current `(x, y)` scroll offsets.
    pub const fn scroll_position(&self) -> (usize, usize) {
        (self.scroll_x, self.scroll_y)
    }

    /// Scroll to absolute offsets, clamped to the content. Returns whether
    /// anything moved.
    pub fn scroll_to(&mut self, x: Option<usize>, y: Option<usize>) -> bool {
        let (max_x, max_y) = self
            .geometry
            .map_or((usize::MAX, usize::MAX), |g| (g.max_scroll_x, g.max_scroll_y));
        let before = (self.scroll_x, self.scroll_y);
        if let Some(x) = x {
            self.scroll_x = x.min(max_x);
        }
        if let Some(y) = y {
            self.scroll_y = y.min(max_y);
        }
        before != (self.scroll_x, self.scroll_y)
    }

    /// Scroll up by `amount` rows.
    pub fn scroll_up(&mut self, amount: usize) -> bool {
        self.scroll_to(None, Some(self.scroll_y.saturating_sub(amount)))
    }

    /// Scroll down by `amount` rows.
    pub fn scroll_down(&mut self, amount: usize) -> bool {
        self.scroll_to(None, Some(self.scroll_y.saturating_add(amount)))
    }

    /// Scroll left by `amount` columns.
    pub fn scroll_left(&mut self, amount: usize) -> bool {
        self.scroll_to(Some(self.scroll_x.saturating_sub(amount)), None)
    }

    /// Scroll right by `amount` columns.
    pub fn scroll_right(&mut self, amount: usize) -> bool {
        self.scroll_to(Some(self.scroll_x.saturating_add(amount)), None)
    }

    // ---------------------------------------------------------------------
    // Positions
    // ---------------------------------------------------------------------

    /// First content row of a block.
    pub fn block_row(&self, id: &str) -> Result<usize> {
        self.lines_width
            .ok_or_else(|| JumperError::NotComputed(self.spec.id.clone()))?;
        let index = self.position(id).ok_or_else(|| self.unknown_block(id))?;
        Ok(self.block_rows[index])
    }

    /// Content coordinates `(col, row)` of a cell in a block, or in the
    /// whole division when `block` is `None`.
    ///
    /// Negative rows count back from the last row. Negative columns count
    /// back from just past the end of the row, so `-1` is the cell after
    /// the last character.
    pub fn locate(&self, block: Option<&str>, col: isize, row: isize) -> Result<(usize, usize)> {
        self.lines_width
            .ok_or_else(|| JumperError::NotComputed(self.spec.id.clone()))?;

        let (start, len) = match block {
            Some(id) => {
                let index = self.position(id).ok_or_else(|| self.unknown_block(id))?;
                let start = self.block_rows[index];
                let end = self.block_rows.get(index + 1).copied().unwrap_or(self.lines.len());
                (start, end - start)
            }
            None => (0, self.lines.len()),
        };
        let row = start + resolve_index(row, len)?;

        let col = if col < 0 {
            let width = isize::try_from(self.lines[row].width).unwrap_or(isize::MAX);
            usize::try_from(width + 1 + col).unwrap_or(0)
        } else {
            col.unsigned_abs()
        };

        Ok((col, row))
    }

    /// Scroll so the content cell `(col, row)` is visible. Returns whether
    /// anything moved.
    pub fn reveal(&mut self, col: usize, row: usize) -> Result<bool> {
        let geometry = *self.geometry()?;
        let width = usize::from(geometry.content_width);
        let height = usize::from(geometry.content_height);

        let mut x = self.scroll_x;
        if col < x {
            x = col;
        } else if col > x + width {
            // the cell just past the content stays reachable so a caret can sit after the last column
            x = col - width;
        }

        let mut y = self.scroll_y;
        if row < y {
            y = row;
        } else if height > 0 && row >= y + height {
            y = row + 1 - height;
        }

        Ok(self.scroll_to(Some(x), Some(y)))
    }

    /// Absolute terminal cell of the content cell `(col, row)`, clamped to
    /// the visible area.
    pub fn screen_position(&self, origin: Origin, col: usize, row: usize) -> Result<(u16, u16)> {
        let geometry = self.geometry()?;
        let x = col
            .saturating_sub(self.scroll_x)
            .min(usize::from(geometry.content_width));
        let y = row
            .saturating_sub(self.scroll_y)
            .min(usize::from(geometry.content_height.saturating_sub(1)));
        let rect = geometry.rect.offset(origin.col, origin.row);

        // both offsets are bounded by u16 content dimensions
        let x = u16::try_from(x).unwrap_or(u16::MAX);
        let y = u16::try_from(y).unwrap_or(u16::MAX);
        Ok((rect.x.saturating_add(x), rect.y.saturating_add(y)))
    }

    // ---------------------------------------------------------------------
    // Output
    // ---------------------------------------------------------------------

    /// Draw the division at `origin`, recording the footprint for erase.
    pub fn render_string(&mut self, origin: Origin) -> Result<String> {
        let geometry = *self.geometry()?;
        let rect = geometry.rect.offset(origin.col, origin.row);
        let content_width = usize::from(geometry.content_width);
        let mut out = OutputBuffer::with_capacity(content_width * usize::from(rect.height) * 2);

        let mut vertical = match (&self.spec.scrollbar_y, geometry.scrollbar_y) {
            (Some(bar), true) => Some(
                bar.track(
                    usize::from(geometry.content_height),
                    geometry.natural_height,
                    self.scroll_y,
                )
                .into_iter(),
            ),
            _ => None,
        };

        for row in 0..geometry.content_height {
            out.cursor_move(rect.x, rect.y.saturating_add(row));
            let text = self
                .lines
                .get(self.scroll_y + usize::from(row))
                .map(|line| slice_columns(&line.text, self.scroll_x, self.scroll_x + content_width))
                .unwrap_or_default();
            out.write_str(&text);
            if text.contains('\x1b') {
                out.reset_attrs();
            }
            out.spaces(content_width.saturating_sub(display_width(&text)));
            if let Some(glyph) = vertical.as_mut().and_then(Iterator::next) {
                out.write_str(glyph);
            }
        }

        if let (Some(bar), true) = (&self.spec.scrollbar_x, geometry.scrollbar_x) {
            out.cursor_move(rect.x, rect.y.saturating_add(geometry.content_height));
            for glyph in bar.track(content_width, geometry.natural_width, self.scroll_x) {
                out.write_str(glyph);
            }
        }

        self.last_render = Some(rect);
        Ok(out.into_string())
    }

    /// Blank the last rendered footprint. Before any render this blanks the
    /// resolved rectangle, if there is one.
    pub fn erase_string(&self, origin: Origin) -> String {
        let rect = self
            .last_render
            .or_else(|| self.geometry.map(|g| g.rect.offset(origin.col, origin.row)));
        let mut out = OutputBuffer::new();
        if let Some(rect) = rect {
            out.blank(rect.x, rect.y, rect.width, rect.height);
        }
        out.into_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{OverflowY, Scrollbar};

    fn ctx(resolved: &HashMap<String, Rect>) -> LayoutContext<'_> {
        LayoutContext {
            terminal_width: 80,
            available_height: 24,
            resolved,
        }
    }

    fn division(spec: DivisionSpec, texts: &[&str]) -> Division {
        let mut division = Division::new(spec).unwrap();
        for text in texts {
            division.add_block(*text, None, None).unwrap();
        }
        division.recompute(true, &ctx(&HashMap::new())).unwrap();
        division
    }

    #[test]
    fn test_auto_height_follows_content() {
        let d = division(DivisionSpec::new("a").top(0).left(0).width("100%"), &["abc"]);
        assert_eq!(d.rect().unwrap(), Rect::new(0, 0, 80, 1));
        assert_eq!(d.natural_width().unwrap(), 3);
    }

    #[test]
    fn test_bottom_anchor() {
        let d = division(
            DivisionSpec::new("a").bottom(0).left(0).width("100%"),
            &["1\n2\n3\n4\n5"],
        );
        assert_eq!(d.top().unwrap(), 19);
        assert_eq!(d.height().unwrap(), 5);
    }

    #[test]
    fn test_right_anchor_and_percent_width() {
        let d = division(DivisionSpec::new("a").top(0).right(2).width("50% - 2"), &[]);
        let rect = d.rect().unwrap();
        assert_eq!(rect.width, 38);
        assert_eq!(rect.x, 40);
    }

    #[test]
    fn test_height_is_clamped_to_viewport() {
        let d = division(DivisionSpec::new("a").top(20).left(0).width(10).height(10), &[]);
        assert_eq!(d.height().unwrap(), 4);

        let d = division(DivisionSpec::new("a").top(30).left(0).width(10), &["x"]);
        assert_eq!(d.height().unwrap(), 0);
    }

    #[test]
    fn test_negative_positions_clamp_to_zero() {
        let d = division(DivisionSpec::new("a").bottom(0).left(0).width(10).height(40), &[]);
        assert_eq!(d.top().unwrap(), 0);
        assert_eq!(d.height().unwrap(), 24);
    }

    #[test]
    fn test_fill_height() {
        let d = division(DivisionSpec::new("a").top(4).left(0).width(10).fill_height(), &["x"]);
        assert_eq!(d.height().unwrap(), 20);
    }

    #[test]
    fn test_references() {
        let mut resolved = HashMap::new();
        resolved.insert("head".to_string(), Rect::new(0, 0, 30, 3));

        let mut d = Division::new(
            DivisionSpec::new("body")
                .top("{head} + 1")
                .left("{head}")
                .width("{head}width / 2")
                .height("{head}height"),
        )
        .unwrap();
        assert_eq!(d.references(), vec!["head".to_string()]);
        d.recompute(true, &ctx(&resolved)).unwrap();
        assert_eq!(d.rect().unwrap(), Rect::new(30, 4, 15, 3));
    }

    #[test]
    fn test_unknown_reference() {
        let mut d = Division::new(DivisionSpec::new("a").top("{ghost}").left(0).width(1)).unwrap();
        let err = d.recompute(true, &ctx(&HashMap::new())).unwrap_err();
        assert!(matches!(err, JumperError::UnknownDivision(id) if id == "ghost"));
    }

    #[test]
    fn test_geometry_before_recompute() {
        let d = Division::new(DivisionSpec::new("a").top(0).left(0).width(1)).unwrap();
        assert!(matches!(d.rect(), Err(JumperError::NotComputed(_))));
    }

    #[test]
    fn test_block_management() {
        let mut d = Division::new(DivisionSpec::new("a").top(0).left(0).width(10)).unwrap();
        assert_eq!(d.add_block("one", None, None).unwrap(), "block-0");
        assert_eq!(d.add_block("zero", Some("first"), Some(0)).unwrap(), "first");
        assert_eq!(d.block_at(0).unwrap(), "first");
        assert_eq!(d.block_at(-1).unwrap(), "block-0");
        assert!(d.add_block("dup", Some("first"), None).is_err());
        assert!(matches!(
            d.add_block("x", None, Some(9)),
            Err(JumperError::OutOfRange { index: 9, len: 2 })
        ));

        d.append_to_block("first", "!").unwrap();
        assert_eq!(d.block("first").unwrap().text(), "zero!");
        d.remove_block("first").unwrap();
        assert!(matches!(d.block("first"), Err(JumperError::UnknownBlock { .. })));

        let ids = d.set_content(["a", "b"]);
        assert_eq!(ids, vec!["block-0".to_string(), "block-1".to_string()]);
        assert_eq!(d.block("block-0").unwrap().text(), "a");

        let ids = d.set_content(["only"]);
        assert_eq!(ids, vec!["block-0".to_string()]);
        assert_eq!(d.block_count(), 1);

        d.clear();
        assert_eq!(d.block_count(), 0);
        assert_eq!(d.add_block("again", None, None).unwrap(), "block-0");
    }

    #[test]
    fn test_render_pads_and_positions() {
        let mut d = division(DivisionSpec::new("a").top(1).left(2).width(4), &["ab"]);
        let out = d.render_string(Origin::new(0, 10)).unwrap();
        assert_eq!(out, "\x1b[12;3Hab  ");
        assert_eq!(d.last_render(), Some(Rect::new(2, 11, 4, 1)));
        assert_eq!(d.erase_string(Origin::new(0, 0)), "\x1b[12;3H    ");
    }

    #[test]
    fn test_scrolling_is_clamped() {
        let mut d = division(
            DivisionSpec::new("a")
                .top(0)
                .left(0)
                .width(5)
                .height(2)
                .overflow_y(OverflowY::Scroll),
            &["1\n2\n3\n4"],
        );
        assert_eq!(d.geometry().unwrap().max_scroll_y, 2);
        assert!(d.scroll_down(10));
        assert_eq!(d.scroll_position(), (0, 2));
        assert!(d.scroll_up(5));
        assert_eq!(d.scroll_position(), (0, 0));
        assert!(!d.scroll_up(1));
    }

    #[test]
    fn test_scrollbars_reserve_cells() {
        let d = division(
            DivisionSpec::new("a")
                .top(0)
                .left(0)
                .width(5)
                .height(3)
                .overflow_x(Overflow::Scroll)
                .overflow_y(OverflowY::Scroll)
                .scrollbar_x(Scrollbar::new("#", "-"))
                .scrollbar_y(Scrollbar::new("#", "|")),
            &["abcdef\n2\n3"],
        );
        let g = d.geometry().unwrap();
        // the horizontal bar takes a row, which forces a vertical bar
        assert!(g.scrollbar_x && g.scrollbar_y);
        assert_eq!((g.content_width, g.content_height), (4, 2));
        assert_eq!((g.max_scroll_x, g.max_scroll_y), (2, 1));
    }

    #[test]
    fn test_wrapped_text_narrows_for_vertical_bar() {
        let d = division(
            DivisionSpec::new("a")
                .top(0)
                .left(0)
                .width(4)
                .height(2)
                .overflow_y(OverflowY::Scroll)
                .scrollbar_y(Scrollbar::new("#", "|"))
                .wrap_on_word(false),
            &["abcdefghij"],
        );
        let g = d.geometry().unwrap();
        assert!(g.scrollbar_y);
        assert_eq!(g.content_width, 3);
        assert_eq!(g.natural_height, 4);
    }

    #[test]
    fn test_locate_and_reveal() {
        let mut d = division(
            DivisionSpec::new("a")
                .top(0)
                .left(0)
                .width(10)
                .height(2)
                .overflow_y(OverflowY::Scroll),
            &["head", "one\ntwo\nthree"],
        );
        assert_eq!(d.block_row("block-1").unwrap(), 1);
        assert_eq!(d.locate(Some("block-1"), 0, -1).unwrap(), (0, 3));
        assert_eq!(d.locate(Some("block-1"), -1, -1).unwrap(), (5, 3));
        assert!(d.locate(Some("block-1"), 0, 3).is_err());

        assert!(d.reveal(0, 3).unwrap());
        assert_eq!(d.scroll_position(), (0, 2));
        assert_eq!(d.screen_position(Origin::new(0, 5), 2, 3).unwrap(), (2, 6));
    }

    #[test]
    fn test_content_rows_counts_horizontal_bar() {
        let spec = DivisionSpec::new("a")
            .top(0)
            .left(0)
            .width(5)
            .overflow_x(Overflow::Scroll)
            .scrollbar_x(Scrollbar::new("#", "-"));
        let mut d = division(spec, &["abc"]);
        assert_eq!(d.content_rows(), Some(1));

        d.set_block_text("block-0", "abcdefgh").unwrap();
        assert_eq!(d.content_rows(), Some(2));
        assert!(Division::new(DivisionSpec::new("b").top(0).left(0).width(5))
            .unwrap()
            .content_rows()
            .is_none());
    }

    #[test]
    fn test_reveal_reaches_cell_past_last_column() {
        let spec = DivisionSpec::new("a")
            .top(0)
            .left(0)
            .width(5)
            .overflow_x(Overflow::Scroll);
        let mut d = division(spec, &["abcdefgh"]);

        assert!(!d.reveal(5, 0).unwrap());
        assert_eq!(d.screen_position(Origin::new(0, 0), 5, 0).unwrap(), (5, 0));
        assert!(d.reveal(8, 0).unwrap());
        assert_eq!(d.scroll_position(), (3, 0));
    }
}
