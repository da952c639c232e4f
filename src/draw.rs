use geo::{Coord, LineString, Polygon};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SketchKind {
    Line,
    Polygon,
}

impl SketchKind {
    /// Committed vertices needed before the sketch can be finished.
    pub fn min_vertices(self) -> usize {
        match self {
            SketchKind::Line => 2,
            SketchKind::Polygon => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SketchId(u64);

#[derive(Debug, Clone, PartialEq)]
pub enum SketchGeometry {
    Line(LineString<f64>),
    Polygon(Polygon<f64>),
}

impl SketchGeometry {
    fn from_coords(kind: SketchKind, coords: Vec<Coord<f64>>) -> Self {
        match kind {
            SketchKind::Line => SketchGeometry::Line(LineString::new(coords)),
            SketchKind::Polygon => SketchGeometry::Polygon(Polygon::new(LineString::new(coords), vec![])),
        }
    }

    /// Outline coordinates; polygon rings come back closed.
    pub fn coords(&self) -> &[Coord<f64>] {
        match self {
            SketchGeometry::Line(line) => &line.0,
            SketchGeometry::Polygon(polygon) => &polygon.exterior().0,
        }
    }

    /// Last coordinate of a line, or the last vertex placed on a polygon.
    pub fn last_coordinate(&self) -> Option<Coord<f64>> {
        match self {
            SketchGeometry::Line(line) => line.0.last().copied(),
            SketchGeometry::Polygon(polygon) => {
                let ring = &polygon.exterior().0;
                ring.len().checked_sub(2).map(|i| ring[i])
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    Start {
        sketch: SketchId,
        coordinate: Coord<f64>,
    },
    Change {
        sketch: SketchId,
        geometry: SketchGeometry,
    },
    End {
        sketch: SketchId,
        geometry: SketchGeometry,
    },
    Abort {
        sketch: SketchId,
    },
}

#[derive(Debug)]
struct Sketch {
    id: SketchId,
    vertices: Vec<Coord<f64>>,
    cursor: Coord<f64>,
}

impl Sketch {
    /// Committed vertices followed by the vertex floating under the pointer.
    fn live_coords(&self) -> Vec<Coord<f64>> {
        let mut coords = self.vertices.clone();
        coords.push(self.cursor);
        coords
    }
}

/// Interaction for one geometry kind; at most one sketch exists at a time.
#[derive(Debug)]
pub struct Draw {
    kind: SketchKind,
    sketch: Option<Sketch>,
    next_id: u64,
}

impl Draw {
    pub fn new(kind: SketchKind) -> Self {
        Self {
            kind,
            sketch: None,
            next_id: 0,
        }
    }

    pub fn is_drawing(&self) -> bool {
        self.sketch.is_some()
    }

    pub fn vertex_count(&self) -> usize {
        self.sketch.as_ref().map_or(0, |s| s.vertices.len())
    }

    /// Current sketch including the floating vertex, for rendering.
    pub fn geometry(&self) -> Option<SketchGeometry> {
        self.sketch
            .as_ref()
            .map(|s| SketchGeometry::from_coords(self.kind, s.live_coords()))
    }

    /// Place a vertex. Clicking within `tolerance` of the last vertex of a
    /// line, or of the first vertex of a polygon, finishes the sketch.
    pub fn click(&mut self, coord: Coord<f64>, tolerance: f64) -> Vec<DrawEvent> {
        let Some(sketch) = self.sketch.as_mut() else {
            let id = SketchId(self.next_id);
            self.next_id += 1;
            let sketch = Sketch {
                id,
                vertices: vec![coord],
                cursor: coord,
            };
            let geometry = SketchGeometry::from_coords(self.kind, sketch.live_coords());
            self.sketch = Some(sketch);
            return vec![
                DrawEvent::Start {
                    sketch: id,
                    coordinate: coord,
                },
                DrawEvent::Change {
                    sketch: id,
                    geometry,
                },
            ];
        };

        let closing_vertex = match self.kind {
            SketchKind::Line => sketch.vertices.last(),
            SketchKind::Polygon => sketch.vertices.first(),
        };
        let closes = closing_vertex
            .is_some_and(|v| (v.x - coord.x).hypot(v.y - coord.y) <= tolerance);
        if closes && sketch.vertices.len() >= self.kind.min_vertices() {
            return self.finish().into_iter().collect();
        }

        sketch.vertices.push(coord);
        sketch.cursor = coord;
        vec![DrawEvent::Change {
            sketch: sketch.id,
            geometry: SketchGeometry::from_coords(self.kind, sketch.live_coords()),
        }]
    }

    /// Move the floating vertex with the pointer.
    pub fn pointer_move(&mut self, coord: Coord<f64>) -> Option<DrawEvent> {
        let sketch = self.sketch.as_mut()?;
        sketch.cursor = coord;
        Some(DrawEvent::Change {
            sketch: sketch.id,
            geometry: SketchGeometry::from_coords(self.kind, sketch.live_coords()),
        })
    }

    /// Complete the sketch from its committed vertices. Ignored while the
    /// sketch has too few vertices.
    pub fn finish(&mut self) -> Option<DrawEvent> {
        if self.vertex_count() < self.kind.min_vertices() {
            return None;
        }
        let sketch = self.sketch.take()?;
        Some(DrawEvent::End {
            sketch: sketch.id,
            geometry: SketchGeometry::from_coords(self.kind, sketch.vertices),
        })
    }

    pub fn abort(&mut self) -> Option<DrawEvent> {
        let sketch = self.sketch.take()?;
        Some(DrawEvent::Abort { sketch: sketch.id })
    }

    /// Drop the last committed vertex; dropping the only one aborts.
    pub fn undo(&mut self) -> Option<DrawEvent> {
        let sketch = self.sketch.as_mut()?;
        if sketch.vertices.len() <= 1 {
            return self.abort();
        }
        sketch.vertices.pop();
        Some(DrawEvent::Change {
            sketch: sketch.id,
            geometry: SketchGeometry::from_coords(self.kind, sketch.live_coords()),
        })
    }
}
