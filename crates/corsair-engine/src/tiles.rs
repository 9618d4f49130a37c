//! Tile ids, tile properties and tile storage.
//!
//! The simulation core only needs point lookups, expressed by the
//! [`TileSource`] trait. Two owning layouts implement it:
//!
//! - [`DenseGrid`] -- one contiguous row-major array for bounded maps.
//! - [`ChunkedGrid`] -- 16x16 chunks allocated on first write and freed on
//!   [`ChunkedGrid::clear`], for large sparse maps.
//!
//! [`TileStorage`] is the enum over both that a [`World`](crate::world::World)
//! owns.
//!
//! Any coordinate outside the grid reads as [`TileId::SOLID`], except above
//! row 0 under [`Bounds::OpenTop`], which reads as [`TileId::BLANK`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// TileId
// ---------------------------------------------------------------------------

/// A tile id byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct TileId(pub u8);

impl TileId {
    /// Empty space.
    pub const BLANK: TileId = TileId(0);
    /// Generic wall. Also returned for out-of-grid reads.
    pub const SOLID: TileId = TileId(1);
    pub const GRASS: TileId = TileId(2);
    pub const GROUND: TileId = TileId(3);
    /// Spawn marker for a [`Captain`](crate::kind::EntityKind::Captain).
    pub const CAPTAIN: TileId = TileId(4);
    /// Spawn marker for a [`Crabby`](crate::kind::EntityKind::Crabby).
    pub const CRABBY: TileId = TileId(5);
}

// ---------------------------------------------------------------------------
// TileTable
// ---------------------------------------------------------------------------

/// Property bit: entities collide with this tile.
pub const PROP_SOLID: u8 = 1 << 0;

/// Per-id tile properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileTable {
    props: [u8; 256],
}

impl TileTable {
    /// A table with no properties set for any id.
    pub fn empty() -> Self {
        Self { props: [0; 256] }
    }

    /// Set the property bits for `id`.
    pub fn set_props(&mut self, id: TileId, props: u8) {
        self.props[id.0 as usize] = props;
    }

    /// Property bits for `id`.
    pub fn props(&self, id: TileId) -> u8 {
        self.props[id.0 as usize]
    }

    /// Whether `id` blocks movement.
    #[inline]
    pub fn is_solid(&self, id: TileId) -> bool {
        self.props(id) & PROP_SOLID != 0
    }
}

impl Default for TileTable {
    /// SOLID, GRASS and GROUND are solid; every other id is passable.
    fn default() -> Self {
        let mut table = Self::empty();
        for id in [TileId::SOLID, TileId::GRASS, TileId::GROUND] {
            table.set_props(id, PROP_SOLID);
        }
        table
    }
}

// ---------------------------------------------------------------------------
// Bounds
// ---------------------------------------------------------------------------

/// What a read outside the grid returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Bounds {
    /// Everything outside the grid is solid.
    #[default]
    Closed,
    /// The area above row 0 (within the horizontal extent) is blank, so
    /// entities can jump above the top of the map.
    OpenTop,
}

impl Bounds {
    /// The tile reported for an out-of-grid coordinate.
    fn outside(self, tx: i32, ty: i32, width: i32) -> TileId {
        match self {
            Bounds::OpenTop if ty < 0 && (0..width).contains(&tx) => TileId::BLANK,
            _ => TileId::SOLID,
        }
    }
}

// ---------------------------------------------------------------------------
// TileSource
// ---------------------------------------------------------------------------

/// Read access to a tile grid.
pub trait TileSource {
    /// Width of the grid in tiles.
    fn width(&self) -> i32;

    /// Height of the grid in tiles.
    fn height(&self) -> i32;

    /// Out-of-grid policy.
    fn bounds(&self) -> Bounds;

    /// The stored tile at `(tx, ty)`, or `None` outside the grid.
    fn cell(&self, tx: i32, ty: i32) -> Option<TileId>;

    /// The tile at integer tile coordinates. Never fails.
    fn tile_at(&self, tx: i32, ty: i32) -> TileId {
        match self.cell(tx, ty) {
            Some(id) => id,
            None => self.bounds().outside(tx, ty, self.width()),
        }
    }

    /// The tile containing the world point `(x, y)`.
    fn get_tile(&self, x: f32, y: f32) -> TileId {
        self.tile_at(x.floor() as i32, y.floor() as i32)
    }

    /// Whether `(tx, ty)` lies inside the grid.
    fn in_grid(&self, tx: i32, ty: i32) -> bool {
        (0..self.width()).contains(&tx) && (0..self.height()).contains(&ty)
    }
}

fn warn_outside(tx: i32, ty: i32, width: i32, height: i32) {
    tracing::warn!(tx, ty, width, height, "tile write outside the grid ignored");
}

// ---------------------------------------------------------------------------
// DenseGrid
// ---------------------------------------------------------------------------

/// A bounded map stored as one row-major array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DenseGridRepr")]
pub struct DenseGrid {
    width: i32,
    height: i32,
    bounds: Bounds,
    cells: Vec<TileId>,
}

impl DenseGrid {
    /// A blank grid of `width` x `height` tiles.
    ///
    /// # Panics
    ///
    /// Panics if either dimension is negative.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width >= 0 && height >= 0, "grid dimensions must be non-negative, got {width}x{height}");
        Self {
            width,
            height,
            bounds: Bounds::Closed,
            cells: vec![TileId::BLANK; (width * height) as usize],
        }
    }

    /// A grid whose every cell is produced by `f(tx, ty)`.
    pub fn from_fn(width: i32, height: i32, mut f: impl FnMut(i32, i32) -> TileId) -> Self {
        let mut grid = Self::new(width, height);
        for ty in 0..height {
            for tx in 0..width {
                grid.cells[(ty * width + tx) as usize] = f(tx, ty);
            }
        }
        grid
    }

    /// Builder-style bounds policy.
    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    #[inline]
    fn index(&self, tx: i32, ty: i32) -> Option<usize> {
        self.in_grid(tx, ty).then(|| (ty * self.width + tx) as usize)
    }

    /// Store `id` at `(tx, ty)`. Returns `false` (and logs) outside the grid.
    pub fn set_tile(&mut self, tx: i32, ty: i32, id: TileId) -> bool {
        match self.index(tx, ty) {
            Some(i) => {
                self.cells[i] = id;
                true
            }
            None => {
                warn_outside(tx, ty, self.width, self.height);
                false
            }
        }
    }

    /// Fill the inclusive rectangle `(x0, y0)..=(x1, y1)` with `id`, clipped
    /// to the grid.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, id: TileId) {
        for ty in y0.max(0)..=y1.min(self.height - 1) {
            for tx in x0.max(0)..=x1.min(self.width - 1) {
                let i = (ty * self.width + tx) as usize;
                self.cells[i] = id;
            }
        }
    }

    /// Change the dimensions, keeping the overlapping region and blanking
    /// new cells.
    pub fn resize(&mut self, width: i32, height: i32) {
        assert!(width >= 0 && height >= 0, "grid dimensions must be non-negative, got {width}x{height}");
        let mut cells = vec![TileId::BLANK; (width * height) as usize];
        for ty in 0..height.min(self.height) {
            for tx in 0..width.min(self.width) {
                cells[(ty * width + tx) as usize] = self.cells[(ty * self.width + tx) as usize];
            }
        }
        self.width = width;
        self.height = height;
        self.cells = cells;
    }

    /// Blank every cell.
    pub fn clear(&mut self) {
        self.cells.fill(TileId::BLANK);
    }
}

impl TileSource for DenseGrid {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn cell(&self, tx: i32, ty: i32) -> Option<TileId> {
        self.index(tx, ty).map(|i| self.cells[i])
    }
}

#[derive(Deserialize)]
struct DenseGridRepr {
    width: i32,
    height: i32,
    bounds: Bounds,
    cells: Vec<TileId>,
}

impl TryFrom<DenseGridRepr> for DenseGrid {
    type Error = String;

    fn try_from(repr: DenseGridRepr) -> Result<Self, Self::Error> {
        if repr.width < 0 || repr.height < 0 {
            return Err(format!("negative grid dimensions {}x{}", repr.width, repr.height));
        }
        let expected = repr.width as usize * repr.height as usize;
        if repr.cells.len() != expected {
            return Err(format!(
                "{}x{} grid needs {expected} cells, found {}",
                repr.width,
                repr.height,
                repr.cells.len()
            ));
        }
        Ok(Self {
            width: repr.width,
            height: repr.height,
            bounds: repr.bounds,
            cells: repr.cells,
        })
    }
}

// ---------------------------------------------------------------------------
// ChunkedGrid
// ---------------------------------------------------------------------------

/// Side length of a chunk, in tiles.
pub const CHUNK_SIZE: i32 = 16;

const CHUNK_LEN: usize = CHUNK_SIZE as usize;

/// Coordinate of a chunk (tile coordinate divided by [`CHUNK_SIZE`]).
pub type ChunkCoord = (i32, i32);

/// One lazily allocated 16x16 block of tiles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    cx: i32,
    cy: i32,
    rows: [[TileId; CHUNK_LEN]; CHUNK_LEN],
}

impl Chunk {
    fn new(cx: i32, cy: i32) -> Self {
        Self {
            cx,
            cy,
            rows: [[TileId::BLANK; CHUNK_LEN]; CHUNK_LEN],
        }
    }

    fn coord(&self) -> ChunkCoord {
        (self.cx, self.cy)
    }
}

fn split(tx: i32, ty: i32) -> (ChunkCoord, usize, usize) {
    (
        (tx.div_euclid(CHUNK_SIZE), ty.div_euclid(CHUNK_SIZE)),
        tx.rem_euclid(CHUNK_SIZE) as usize,
        ty.rem_euclid(CHUNK_SIZE) as usize,
    )
}

/// A bounded map paged into chunks that are allocated on first write.
///
/// The map exclusively owns its chunks. Reads from an in-bounds chunk that
/// was never written return [`TileId::BLANK`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "ChunkedGridRepr", try_from = "ChunkedGridRepr")]
pub struct ChunkedGrid {
    width: i32,
    height: i32,
    bounds: Bounds,
    chunks: HashMap<ChunkCoord, Box<Chunk>>,
}

impl ChunkedGrid {
    /// An empty (chunk-less) grid of `width` x `height` tiles.
    pub fn new(width: i32, height: i32) -> Self {
        assert!(width >= 0 && height >= 0, "grid dimensions must be non-negative, got {width}x{height}");
        Self {
            width,
            height,
            bounds: Bounds::Closed,
            chunks: HashMap::new(),
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    /// Number of allocated chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Store `id` at `(tx, ty)`, allocating the chunk on first touch.
    /// Returns `false` (and logs) outside the grid.
    pub fn set_tile(&mut self, tx: i32, ty: i32, id: TileId) -> bool {
        if !self.in_grid(tx, ty) {
            warn_outside(tx, ty, self.width, self.height);
            return false;
        }
        let (coord, lx, ly) = split(tx, ty);
        let chunk = self
            .chunks
            .entry(coord)
            .or_insert_with(|| Box::new(Chunk::new(coord.0, coord.1)));
        chunk.rows[ly][lx] = id;
        true
    }

    /// Change the dimensions. Chunks wholly outside the new bounds are freed;
    /// cells outside the bounds inside surviving chunks are blanked.
    pub fn resize(&mut self, width: i32, height: i32) {
        assert!(width >= 0 && height >= 0, "grid dimensions must be non-negative, got {width}x{height}");
        self.width = width;
        self.height = height;
        self.chunks
            .retain(|&(cx, cy), _| cx * CHUNK_SIZE < width && cy * CHUNK_SIZE < height);
        for chunk in self.chunks.values_mut() {
            let (ox, oy) = (chunk.cx * CHUNK_SIZE, chunk.cy * CHUNK_SIZE);
            for (ly, row) in chunk.rows.iter_mut().enumerate() {
                for (lx, cell) in row.iter_mut().enumerate() {
                    let tx = ox + lx as i32;
                    let ty = oy + ly as i32;
                    if tx >= width || ty >= height {
                        *cell = TileId::BLANK;
                    }
                }
            }
        }
    }

    /// Free every chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
    }
}

impl TileSource for ChunkedGrid {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn cell(&self, tx: i32, ty: i32) -> Option<TileId> {
        if !self.in_grid(tx, ty) {
            return None;
        }
        let (coord, lx, ly) = split(tx, ty);
        Some(
            self.chunks
                .get(&coord)
                .map_or(TileId::BLANK, |chunk| chunk.rows[ly][lx]),
        )
    }
}

/// Serialized form of a [`ChunkedGrid`]: chunks as a list sorted by
/// coordinate, so the encoding (and its hash) is stable.
#[derive(Serialize, Deserialize)]
struct ChunkedGridRepr {
    width: i32,
    height: i32,
    bounds: Bounds,
    chunks: Vec<Chunk>,
}

impl From<ChunkedGrid> for ChunkedGridRepr {
    fn from(grid: ChunkedGrid) -> Self {
        let mut chunks: Vec<Chunk> = grid.chunks.into_values().map(|c| *c).collect();
        chunks.sort_by_key(Chunk::coord);
        Self {
            width: grid.width,
            height: grid.height,
            bounds: grid.bounds,
            chunks,
        }
    }
}

impl TryFrom<ChunkedGridRepr> for ChunkedGrid {
    type Error = String;

    fn try_from(repr: ChunkedGridRepr) -> Result<Self, Self::Error> {
        if repr.width < 0 || repr.height < 0 {
            return Err(format!(
                "negative grid dimensions {}x{}",
                repr.width, repr.height
            ));
        }
        let mut grid = ChunkedGrid::new(repr.width, repr.height).with_bounds(repr.bounds);
        for chunk in repr.chunks {
            let (cx, cy) = chunk.coord();
            if cx < 0 || cy < 0 || cx * CHUNK_SIZE >= repr.width || cy * CHUNK_SIZE >= repr.height {
                return Err(format!("chunk ({cx}, {cy}) lies outside the grid"));
            }
            if grid.chunks.insert((cx, cy), Box::new(chunk)).is_some() {
                return Err(format!("duplicate chunk ({cx}, {cy})"));
            }
        }
        Ok(grid)
    }
}

// ---------------------------------------------------------------------------
// TileStorage
// ---------------------------------------------------------------------------

/// The tile storage owned by a world: either layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TileStorage {
    Dense(DenseGrid),
    Chunked(ChunkedGrid),
}

impl TileStorage {
    /// Store `id` at `(tx, ty)`. Returns `false` outside the grid.
    pub fn set_tile(&mut self, tx: i32, ty: i32, id: TileId) -> bool {
        match self {
            TileStorage::Dense(grid) => grid.set_tile(tx, ty, id),
            TileStorage::Chunked(grid) => grid.set_tile(tx, ty, id),
        }
    }

    pub fn resize(&mut self, width: i32, height: i32) {
        match self {
            TileStorage::Dense(grid) => grid.resize(width, height),
            TileStorage::Chunked(grid) => grid.resize(width, height),
        }
    }

    pub fn clear(&mut self) {
        match self {
            TileStorage::Dense(grid) => grid.clear(),
            TileStorage::Chunked(grid) => grid.clear(),
        }
    }
}

impl TileSource for TileStorage {
    fn width(&self) -> i32 {
        match self {
            TileStorage::Dense(grid) => grid.width(),
            TileStorage::Chunked(grid) => grid.width(),
        }
    }

    fn height(&self) -> i32 {
        match self {
            TileStorage::Dense(grid) => grid.height(),
            TileStorage::Chunked(grid) => grid.height(),
        }
    }

    fn bounds(&self) -> Bounds {
        match self {
            TileStorage::Dense(grid) => grid.bounds(),
            TileStorage::Chunked(grid) => grid.bounds(),
        }
    }

    fn cell(&self, tx: i32, ty: i32) -> Option<TileId> {
        match self {
            TileStorage::Dense(grid) => grid.cell(tx, ty),
            TileStorage::Chunked(grid) => grid.cell(tx, ty),
        }
    }
}

impl From<DenseGrid> for TileStorage {
    fn from(grid: DenseGrid) -> Self {
        TileStorage::Dense(grid)
    }
}

impl From<ChunkedGrid> for TileStorage {
    fn from(grid: ChunkedGrid) -> Self {
        TileStorage::Chunked(grid)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
