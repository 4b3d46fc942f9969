//! Engine: owns divisions, the dependency graph and terminal state, and
//! sequences render passes.

use super::config::EngineConfig;
use super::injects::{Inject, RenderInjects};
use super::target::Target;
use crate::error::{JumperError, Result};
use crate::graph::{Graph, Status};
use crate::layout::{Division, DivisionSpec, LayoutContext, Rect};
use crate::terminal::{Backend, CrosstermBackend, Origin, OutputBuffer};
use crate::text::Block;
use std::collections::HashMap;
use std::thread;

/// The layout and incremental-redraw engine.
///
/// Generic over the terminal [`Backend`]; [`TestBackend`] renders
/// headlessly.
///
/// [`TestBackend`]: crate::terminal::TestBackend
pub struct Engine<B: Backend = CrosstermBackend> {
    config: EngineConfig,
    backend: B,
    divisions: Vec<Division>,
    graph: Graph,
    injects: RenderInjects,
    /// Terminal width.
    width: u16,
    /// Terminal height.
    height: u16,
    origin: Option<Origin>,
    /// Viewport height fill divisions were last laid out against.
    fill_basis: Option<u16>,
}

impl Engine<CrosstermBackend> {
    /// Create an engine on stdout with default configuration.
    ///
    /// An empty `specs` list creates one full-width division.
    ///
    /// # Errors
    ///
    /// Returns an error if a spec is invalid or the terminal size cannot be
    /// queried.
    pub fn new(specs: Vec<DivisionSpec>) -> Result<Self> {
        Self::with_config(specs, EngineConfig::default())
    }

    /// Create an engine on stdout with custom configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a spec is invalid or the terminal size cannot be
    /// queried.
    pub fn with_config(specs: Vec<DivisionSpec>, config: EngineConfig) -> Result<Self> {
        Self::with_backend(CrosstermBackend::new(), specs, config)
    }
}

impl<B: Backend> Engine<B> {
    /// Create an engine drawing on `backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if a spec is invalid or the backend size query
    /// fails.
    pub fn with_backend(backend: B, specs: Vec<DivisionSpec>, config: EngineConfig) -> Result<Self> {
        let (width, height) = backend.size()?;
        let mut engine = Self {
            config,
            backend,
            divisions: Vec::new(),
            graph: Graph::new(),
            injects: RenderInjects::new(),
            width,
            height,
            origin: None,
            fill_basis: None,
        };
        let specs = engine.or_default(specs);
        engine.add_divisions(specs)?;
        Ok(engine)
    }

    fn or_default(&self, specs: Vec<DivisionSpec>) -> Vec<DivisionSpec> {
        if specs.is_empty() {
            vec![DivisionSpec::new(&self.config.default_division_id)
                .top(0)
                .left(0)
                .width("100%")]
        } else {
            specs
        }
    }

    // ---------------------------------------------------------------------
    // State
    // ---------------------------------------------------------------------

    /// Terminal size as `(columns, rows)`.
    pub const fn size(&self) -> (u16, u16) {
        (self.width, self.height)
    }

    /// Where output begins, once known.
    pub const fn origin(&self) -> Option<Origin> {
        self.origin
    }

    /// Fix the origin instead of querying the cursor on first render.
    pub fn set_origin(&mut self, origin: Origin) {
        self.origin = Some(origin);
    }

    /// The engine configuration.
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The terminal backend.
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// The terminal backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// The dependency graph.
    pub const fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Rows from the origin to the lowest division edge.
    pub fn total_height(&self) -> u16 {
        self.divisions
            .iter()
            .filter_map(|division| division.bottom().ok())
            .max()
            .unwrap_or(0)
    }

    /// Establish the origin, querying the cursor if needed.
    ///
    /// A cursor in the middle of a line starts output on the next row.
    fn ensure_origin(&mut self) -> Result<Origin> {
        if let Some(origin) = self.origin {
            return Ok(origin);
        }

        let attempts = self.config.cursor_query_attempts.max(1);
        let mut attempt = 0;
        let (col, row) = loop {
            match self.backend.cursor_position() {
                Ok(position) => break position,
                Err(err) => {
                    attempt += 1;
                    tracing::warn!(attempt, %err, "cursor position query failed");
                    if attempt >= attempts {
                        return Err(err.into());
                    }
                    thread::sleep(self.config.cursor_query_backoff);
                }
            }
        };

        let origin = if col == 0 {
            Origin::new(0, row)
        } else {
            Origin::new(0, row.saturating_add(1))
        };
        tracing::debug!(row = origin.row, "origin established");
        self.origin = Some(origin);
        Ok(origin)
    }

    // ---------------------------------------------------------------------
    // Divisions
    // ---------------------------------------------------------------------

    fn index(&self, id: &str) -> Result<usize> {
        self.divisions
            .iter()
            .position(|division| division.id() == id)
            .ok_or_else(|| JumperError::UnknownDivision(id.to_string()))
    }

    /// Whether a division with this id exists.
    pub fn has_division(&self, id: &str) -> bool {
        self.divisions.iter().any(|division| division.id() == id)
    }

    /// Get a division by id.
    pub fn division(&self, id: &str) -> Result<&Division> {
        self.index(id).map(|index| &self.divisions[index])
    }

    /// Division ids in registration order.
    pub fn division_ids(&self) -> impl Iterator<Item = &str> {
        self.divisions.iter().map(Division::id)
    }

    fn build(specs: Vec<DivisionSpec>, existing: &[Division]) -> Result<Vec<Division>> {
        let mut built: Vec<Division> = Vec::with_capacity(specs.len());
        for spec in specs {
            let taken = existing.iter().chain(&built).any(|d| d.id() == spec.id);
            if taken {
                return Err(JumperError::config(&spec.id, "division id already exists"));
            }
            built.push(Division::new(spec)?);
        }
        Ok(built)
    }

    fn rebuild_graph(&mut self) {
        self.graph.set_divisions(&self.divisions);
        self.graph.calculate_graph(&self.divisions);
    }

    /// Register a division.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the spec is invalid or its id is
    /// taken.
    pub fn add_division(&mut self, spec: DivisionSpec) -> Result<()> {
        self.add_divisions(vec![spec])
    }

    /// Register several divisions. Nothing is added unless all are valid.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any spec is invalid or any id is
    /// taken.
    pub fn add_divisions(&mut self, specs: Vec<DivisionSpec>) -> Result<()> {
        let built = Self::build(specs, &self.divisions)?;
        for division in &built {
            tracing::debug!(division = division.id(), "added division");
        }
        self.divisions.extend(built);
        self.rebuild_graph();
        Ok(())
    }

    /// Remove a division, erasing what it last drew.
    ///
    /// Divisions laid out relative to it are marked dirty.
    ///
    /// # Errors
    ///
    /// Returns an error if the division does not exist.
    pub fn remove_division(&mut self, id: &str) -> Result<()> {
        self.index(id)?;
        self.mark_dirty(Some(id))?;
        self.divisions.retain(|division| division.id() != id);
        self.injects.remove(&format!("{id}:"));
        self.rebuild_graph();
        tracing::debug!(division = id, "removed division");
        Ok(())
    }

    /// Remove several divisions. Nothing is removed unless all exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any division does not exist.
    pub fn remove_divisions(&mut self, ids: &[&str]) -> Result<()> {
        for id in ids {
            self.index(id)?;
        }
        for id in ids {
            self.remove_division(id)?;
        }
        Ok(())
    }

    /// Replace every division. The old output is erased on the next pass.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if any spec is invalid; the engine is
    /// left unchanged.
    pub fn reset(&mut self, specs: Vec<DivisionSpec>) -> Result<()> {
        let specs = self.or_default(specs);
        let divisions = Self::build(specs, &[])?;

        let erase = self.footprints();
        self.injects = RenderInjects::new();
        if !erase.is_empty() {
            self.injects.set("before:erase:reset", Inject::Text(erase));
        }

        self.divisions = divisions;
        self.graph = Graph::new();
        self.rebuild_graph();
        self.fill_basis = None;
        tracing::debug!(divisions = self.divisions.len(), "engine reset");
        Ok(())
    }

    /// Blank every rendered footprint.
    fn footprints(&self) -> String {
        let origin = self.origin.unwrap_or_default();
        self.divisions
            .iter()
            .filter(|division| division.last_render().is_some())
            .map(|division| division.erase_string(origin))
            .collect()
    }

    // ---------------------------------------------------------------------
    // Content
    // ---------------------------------------------------------------------

    /// Add a block to a division, returning the block id.
    ///
    /// # Errors
    ///
    /// Returns an error if the division does not exist, the id is taken or
    /// the index is past the end.
    pub fn add_block(
        &mut self,
        division: &str,
        text: impl Into<String>,
        id: Option<&str>,
        index: Option<usize>,
    ) -> Result<String> {
        let position = self.index(division)?;
        let block = self.divisions[position].add_block(text, id, index)?;
        self.mark_dirty(Some(division))?;
        Ok(block)
    }

    /// Get a block by `"<division>.<block>"` path.
    ///
    /// # Errors
    ///
    /// Returns an error if the division or block does not exist.
    pub fn block(&self, target: &str) -> Result<&Block> {
        let target = Target::parse(target)?;
        self.division(target.division)?.block(target.block_id()?)
    }

    /// Replace a block's text.
    ///
    /// An edit that keeps the division's content rows (lines plus any
    /// horizontal scrollbar row) only redraws the division; otherwise the
    /// division and its dependents are laid out again.
    ///
    /// # Errors
    ///
    /// Returns an error if the division or block does not exist.
    pub fn set_block_content(&mut self, target: &str, text: impl Into<String>) -> Result<()> {
        self.edit_block(target, move |division, block| division.set_block_text(block, text))
    }

    /// Append to a block's text, classified like [`Self::set_block_content`].
    ///
    /// # Errors
    ///
    /// Returns an error if the division or block does not exist.
    pub fn append(&mut self, target: &str, text: &str) -> Result<()> {
        self.edit_block(target, |division, block| division.append_to_block(block, text))
    }

    fn edit_block<F>(&mut self, target: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Division, &str) -> Result<()>,
    {
        let target = Target::parse(target)?;
        let block = target.block_id()?;
        let position = self.index(target.division)?;
        let division = &mut self.divisions[position];

        let before = division.content_rows();
        edit(division, block)?;
        let after = division.content_rows();

        if before.is_some() && before == after {
            tracing::trace!(%target, "edit kept content rows");
            self.graph.set_needs_render(target.division)
        } else {
            self.mark_dirty(Some(target.division))
        }
    }

    /// Remove a block and return it.
    ///
    /// # Errors
    ///
    /// Returns an error if the division or block does not exist.
    pub fn remove_block(&mut self, target: &str) -> Result<Block> {
        let target = Target::parse(target)?;
        let block = target.block_id()?;
        let position = self.index(target.division)?;
        let removed = self.divisions[position].remove_block(block)?;
        self.mark_dirty(Some(target.division))?;
        Ok(removed)
    }

    /// Replace a division's content block by block, returning block ids.
    ///
    /// # Errors
    ///
    /// Returns an error if the division does not exist.
    pub fn set_content<I, S>(&mut self, division: &str, texts: I) -> Result<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let position = self.index(division)?;
        let ids = self.divisions[position].set_content(texts);
        self.mark_dirty(Some(division))?;
        Ok(ids)
    }

    /// Drop every block of a division and scroll it back to the origin.
    ///
    /// # Errors
    ///
    /// Returns an error if the division does not exist.
    pub fn reset_division(&mut self, division: &str) -> Result<()> {
        let position = self.index(division)?;
        self.divisions[position].clear();
        self.mark_dirty(Some(division))
    }

    // ---------------------------------------------------------------------
    // Graph status
    // ---------------------------------------------------------------------

    /// Mark a division (or every division) and its dependents dirty,
    /// queueing an erase of each one's last footprint.
    ///
    /// # Errors
    ///
    /// Returns an error if the division does not exist.
    pub fn mark_dirty(&mut self, id: Option<&str>) -> Result<()> {
        let origin = self.origin.unwrap_or_default();
        propagate_dirty(&mut self.graph, &mut self.divisions, &mut self.injects, origin, id, true)
    }

    /// Queue an inject for the next render pass.
    pub fn inject(&mut self, tag: impl Into<String>, inject: Inject) {
        self.injects.set(tag, inject);
    }

    /// The inject queue.
    pub fn injects_mut(&mut self) -> &mut RenderInjects {
        &mut self.injects
    }

    // ---------------------------------------------------------------------
    // Rendering
    // ---------------------------------------------------------------------

    /// Run a render pass and write it to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if layout fails or the backend cannot be written.
    pub fn render(&mut self) -> Result<()> {
        let output = self.render_string()?;
        self.backend.write_all(&output)?;
        Ok(())
    }

    /// Run a render pass and return its output instead of writing it.
    ///
    /// # Errors
    ///
    /// Returns an error if an expression fails, a reference is unknown or
    /// cyclic, or the origin cannot be established.
    pub fn render_string(&mut self) -> Result<String> {
        let mut origin = self.ensure_origin()?;
        let mut out = OutputBuffer::new();

        if self.fill_basis != Some(self.height) {
            let fills: Vec<String> = self
                .divisions
                .iter()
                .filter(|division| division.is_fill())
                .map(|division| division.id().to_string())
                .collect();
            for id in &fills {
                propagate_dirty(
                    &mut self.graph,
                    &mut self.divisions,
                    &mut self.injects,
                    origin,
                    Some(id),
                    false,
                )?;
            }
            self.fill_basis = Some(self.height);
        }

        let dirty = self.graph.dirty();
        let mut resolved: HashMap<String, Rect> = self
            .divisions
            .iter()
            .filter(|division| self.graph.status(division.id()) != Some(Status::Dirty))
            .filter_map(|division| Some((division.id().to_string(), division.rect().ok()?)))
            .collect();
        for id in &dirty {
            self.resolve(id, &mut resolved, &mut Vec::new())?;
        }

        // queued erases survive a pass that fails to resolve
        out.write_str(&self.injects.take("before:"));

        let overflow = origin
            .row
            .saturating_add(self.total_height())
            .saturating_sub(self.height)
            .min(origin.row);
        if overflow > 0 {
            out.cursor_move(0, self.height.saturating_sub(1));
            out.write_str(&"\n".repeat(usize::from(overflow)));
            origin.row -= overflow;
            self.origin = Some(origin);
            for division in &mut self.divisions {
                division.shift_last_render(overflow);
            }
        }

        let queue = self.graph.render_queue();
        for id in &queue {
            let position = self.index(id)?;
            out.write_str(&self.injects.take(&format!("{id}:before:")));
            let division = &mut self.divisions[position];
            division.refresh_content()?;
            out.write_str(&division.render_string(origin)?);
            out.write_str(&self.injects.take(&format!("{id}:after:")));
        }

        out.write_str(&self.injects.take("after:"));
        self.graph.reset();

        tracing::debug!(
            dirty = dirty.len(),
            rendered = queue.len(),
            overflow,
            bytes = out.as_str().len(),
            "render pass"
        );
        Ok(out.into_string())
    }

    /// Recompute `id`, after every division it references.
    fn resolve(
        &mut self,
        id: &str,
        resolved: &mut HashMap<String, Rect>,
        chain: &mut Vec<String>,
    ) -> Result<()> {
        if resolved.contains_key(id) {
            return Ok(());
        }
        if chain.iter().any(|link| link == id) {
            let mut cycle = chain.clone();
            cycle.push(id.to_string());
            return Err(JumperError::CyclicReference { chain: cycle });
        }

        let position = self.index(id)?;
        chain.push(id.to_string());
        for reference in self.divisions[position].references() {
            if self.has_division(&reference) {
                self.resolve(&reference, resolved, chain)?;
            }
        }
        chain.pop();

        let ctx = LayoutContext {
            terminal_width: self.width,
            available_height: self.height,
            resolved: &*resolved,
        };
        let division = &mut self.divisions[position];
        division.recompute(true, &ctx)?;
        let rect = division.rect()?;
        resolved.insert(id.to_string(), rect);
        self.graph.mark_recomputed(id)
    }

    /// Erase everything the engine has drawn and write it to the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend cannot be written.
    pub fn erase(&mut self) -> Result<()> {
        let output = self.erase_string()?;
        self.backend.write_all(&output)?;
        Ok(())
    }

    /// Blank every division's last footprint. The next render redraws all.
    ///
    /// # Errors
    ///
    /// Infallible for registered divisions; kept fallible for symmetry with
    /// the other passes.
    pub fn erase_string(&mut self) -> Result<String> {
        let output = self.footprints();
        for division in &self.divisions {
            self.graph.set_needs_render(division.id())?;
        }
        Ok(output)
    }

    // ---------------------------------------------------------------------
    // Cursor
    // ---------------------------------------------------------------------

    /// Move the cursor to a cell of a division or block.
    ///
    /// # Errors
    ///
    /// See [`Self::jump_to_string`].
    pub fn jump_to(&mut self, target: &str, col: isize, row: isize) -> Result<()> {
        let output = self.jump_to_string(target, col, row)?;
        self.backend.write_all(&output)?;
        Ok(())
    }

    /// Output that moves the cursor to `(col, row)` of `target`.
    ///
    /// Negative coordinates count from the far edge: row `-1` is the last
    /// row and column `-1` the cell just past the last character. Pending
    /// changes are rendered first, and the division scrolls (and renders
    /// again) when the cell is off screen.
    ///
    /// # Errors
    ///
    /// Returns an error if the target does not exist or the row is out of
    /// range.
    pub fn jump_to_string(&mut self, target: &str, col: isize, row: isize) -> Result<String> {
        let target = Target::parse(target)?;
        let position = self.index(target.division)?;
        let mut out = String::new();

        if !self.graph.is_clean() || !self.divisions[position].is_computed() {
            out.push_str(&self.render_string()?);
        }

        let (content_col, content_row) = self.divisions[position].locate(target.block, col, row)?;
        if self.divisions[position].reveal(content_col, content_row)? {
            self.graph.set_needs_render(target.division)?;
            out.push_str(&self.render_string()?);
        }

        let origin = self.ensure_origin()?;
        let (x, y) = self.divisions[position].screen_position(origin, content_col, content_row)?;
        let mut cursor = OutputBuffer::new();
        cursor.cursor_move(x, y);
        out.push_str(cursor.as_str());
        Ok(out)
    }

    // ---------------------------------------------------------------------
    // Scrolling
    // ---------------------------------------------------------------------

    fn scroll<F>(&mut self, id: &str, scroll: F) -> Result<()>
    where
        F: FnOnce(&mut Division) -> bool,
    {
        let position = self.index(id)?;
        if scroll(&mut self.divisions[position]) {
            self.graph.set_needs_render(id)?;
        }
        Ok(())
    }

    /// Scroll a division to column `x`.
    ///
    /// # Errors
    ///
    /// Returns an error if the division does not exist.
    pub fn scroll_x(&mut self, id: &str, x: usize) -> Result<()> {
        self.scroll(id, |division| division.scroll_to(Some(x), None))
    }

    /// Scroll a division to row `y`.
    ///
    /// # Errors
    ///
    /// Returns an error if the division does not exist.
    pub fn scroll_y(&mut self, id: &str, y: usize) -> Result<()> {
        self.scroll(id, |division| division.scroll_to(None, Some(y)))
    }

    /// Scroll a division up.
    ///
    /// # Errors
    ///
    /// Returns an error if the division does not exist.
    pub fn scroll_up(&mut self, id: &str, amount: usize) -> Result<()> {
        self.scroll(id, |division| division.scroll_up(amount))
    }

    /// Scroll a division down.
    ///
    /// # Errors
    ///
    /// Returns an error if the division does not exist.
    pub fn scroll_down(&mut self, id: &str, amount: usize) -> Result<()> {
        self.scroll(id, |division| division.scroll_down(amount))
    }

    /// Scroll a division left.
    ///
    /// # Errors
    ///
    /// Returns an error if the division does not exist.
    pub fn scroll_left(&mut self, id: &str, amount: usize) -> Result<()> {
        self.scroll(id, |division| division.scroll_left(amount))
    }

    /// Scroll a division right.
    ///
    /// # Errors
    ///
    /// Returns an error if the division does not exist.
    pub fn scroll_right(&mut self, id: &str, amount: usize) -> Result<()> {
        self.scroll(id, |division| division.scroll_right(amount))
    }

    // ---------------------------------------------------------------------
    // Resize
    // ---------------------------------------------------------------------

    /// Handle a (debounced) terminal resize.
    ///
    /// The terminal reflows old output unpredictably, so everything below
    /// the origin is erased and every division is laid out again.
    pub fn resize(&mut self, width: u16, height: u16) {
        tracing::debug!(width, height, "resize");
        self.width = width;
        self.height = height;

        if let Some(origin) = &mut self.origin {
            origin.row = origin.row.min(height.saturating_sub(1));
        }
        let origin = self.origin.unwrap_or_default();

        let mut blank = OutputBuffer::new();
        blank.cursor_move(origin.col, origin.row);
        blank.erase_down();
        self.injects.remove("before:erase:");
        self.injects.set("before:resize", Inject::Text(blank.into_string()));

        self.graph.set_all_dirty();
        for division in &mut self.divisions {
            division.invalidate();
        }
    }

    /// Query the backend size and resize if it changed. Returns whether it
    /// did.
    ///
    /// # Errors
    ///
    /// Returns an error if the size query fails.
    pub fn sync_size(&mut self) -> Result<bool> {
        let (width, height) = self.backend.size()?;
        if (width, height) == (self.width, self.height) {
            return Ok(false);
        }
        self.resize(width, height);
        Ok(true)
    }
}

/// Dirty `id` (or everything) and its dependents, invalidating their
/// geometry and optionally queueing an erase of each old footprint.
fn propagate_dirty(
    graph: &mut Graph,
    divisions: &mut [Division],
    injects: &mut RenderInjects,
    origin: Origin,
    id: Option<&str>,
    erase: bool,
) -> Result<()> {
    graph.set_dirty(id, |visited, _depth| {
        let Some(division) = divisions.iter_mut().find(|d| d.id() == visited) else {
            return;
        };
        if erase {
            let blank = division.erase_string(origin);
            if !blank.is_empty() {
                injects.set(format!("before:erase:{visited}"), Inject::Text(blank));
            }
        }
        division.invalidate();
    })
}
