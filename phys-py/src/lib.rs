//! Python bindings for the phys-core collision engine.
//!
//! Provides a simple Python API:
//!
//! ```python
//! from phys2d import World
//!
//! world = World(0.0, 0.0, 960.0, 640.0, 4, 4)
//! edge = world.add_box(480.0, 5.0, 960.0, 10.0, category=8, hit=255)
//! ball = world.add_circle(480.0, 100.0, 10.0, vx=0.0, vy=-200.0, category=1, hit=8)
//!
//! for _ in range(60):
//!     for kind, a, b in world.step(1 / 60):
//!         print(f"{kind} between {a} and {b}")
//! ```
//!
//! Bodies are referred to by integer ids. Ids are never reused; an id of a
//! removed body simply stops resolving.

mod ids;

use ids::BodyIds;

use pyo3::exceptions::{PyKeyError, PyValueError};
use pyo3::prelude::*;

use phys_core::{
    Body, BodyHandle, Collider, CollisionMask, ContactKind, LinearMovement, PhysError,
    Vec2 as CoreVec2, WeavingMovement, World as CoreWorld, WorldConfig,
};

/// 2D vector for positions and velocities.
#[pyclass]
#[derive(Clone, Copy)]
pub struct Vec2 {
    #[pyo3(get, set)]
    pub x: f64,
    #[pyo3(get, set)]
    pub y: f64,
}

#[pymethods]
impl Vec2 {
    #[new]
    fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn __repr__(&self) -> String {
        format!("Vec2({:.4}, {:.4})", self.x, self.y)
    }

    fn magnitude(&self) -> f64 {
        CoreVec2::from(*self).magnitude()
    }

    fn to_tuple(&self) -> (f64, f64) {
        (self.x, self.y)
    }
}

impl From<CoreVec2> for Vec2 {
    fn from(v: CoreVec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

impl From<Vec2> for CoreVec2 {
    fn from(v: Vec2) -> Self {
        CoreVec2::new(v.x, v.y)
    }
}

fn value_error(err: PhysError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

/// Collision world.
///
/// Owns bodies, steps them and reports contacts that start each tick.
#[pyclass(unsendable)]
pub struct World {
    inner: CoreWorld,
    ids: BodyIds,
    time: f64,
}

impl World {
    fn handle(&self, id: usize) -> PyResult<BodyHandle> {
        self.ids
            .handle(id)
            .filter(|handle| self.inner.contains(*handle))
            .ok_or_else(|| PyKeyError::new_err(format!("no body with id {}", id)))
    }

    fn id_of(&self, handle: BodyHandle) -> Option<usize> {
        self.ids.id_of(handle)
    }

    fn insert(&mut self, body: Body) -> usize {
        let handle = self.inner.add_body(body);
        self.ids.insert(handle)
    }
}

#[pymethods]
impl World {
    /// Create a world covering the given rectangle, split into a grid.
    #[new]
    #[pyo3(signature = (x=0.0, y=0.0, width=960.0, height=640.0, columns=4, rows=4))]
    fn new(x: f64, y: f64, width: f64, height: f64, columns: usize, rows: usize) -> PyResult<Self> {
        let inner = CoreWorld::new(WorldConfig {
            origin: CoreVec2::new(x, y),
            size: CoreVec2::new(width, height),
            columns,
            rows,
        })
        .map_err(value_error)?;
        Ok(Self {
            inner,
            ids: BodyIds::default(),
            time: 0.0,
        })
    }

    /// Simulated time in seconds.
    #[getter]
    fn time(&self) -> f64 {
        self.time
    }

    /// Number of bodies, including those queued for removal.
    fn body_count(&self) -> usize {
        self.inner.body_count()
    }

    /// Add a circle body and return its id.
    ///
    /// Without a velocity the body is kinematic.
    #[pyo3(signature = (x, y, radius, vx=None, vy=None, mass=1.0, bounciness=1.0, category=1, hit=1, overlap=0))]
    #[allow(clippy::too_many_arguments)]
    fn add_circle(
        &mut self,
        x: f64,
        y: f64,
        radius: f64,
        vx: Option<f64>,
        vy: Option<f64>,
        mass: f64,
        bounciness: f64,
        category: u16,
        hit: u16,
        overlap: u16,
    ) -> PyResult<usize> {
        let collider = Collider::circle(radius)
            .map_err(value_error)?
            .with_mask(CollisionMask::new(category, hit, overlap));
        let mut body = Body::new(CoreVec2::new(x, y), mass, bounciness)
            .map_err(value_error)?
            .with_collider(collider);
        if vx.is_some() || vy.is_some() {
            let velocity = CoreVec2::new(vx.unwrap_or(0.0), vy.unwrap_or(0.0));
            body.set_movement(LinearMovement::new(velocity));
        }
        Ok(self.insert(body))
    }

    /// Add an axis-aligned box body centered on (x, y) and return its id.
    #[pyo3(signature = (x, y, width, height, vx=None, vy=None, mass=1.0, bounciness=1.0, category=1, hit=1, overlap=0))]
    #[allow(clippy::too_many_arguments)]
    fn add_box(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        vx: Option<f64>,
        vy: Option<f64>,
        mass: f64,
        bounciness: f64,
        category: u16,
        hit: u16,
        overlap: u16,
    ) -> PyResult<usize> {
        let collider = Collider::rect(width, height)
            .map_err(value_error)?
            .with_mask(CollisionMask::new(category, hit, overlap));
        let mut body = Body::new(CoreVec2::new(x, y), mass, bounciness)
            .map_err(value_error)?
            .with_collider(collider);
        if vx.is_some() || vy.is_some() {
            let velocity = CoreVec2::new(vx.unwrap_or(0.0), vy.unwrap_or(0.0));
            body.set_movement(LinearMovement::new(velocity));
        }
        Ok(self.insert(body))
    }

    /// Give a body a weaving movement.
    fn set_weaving(
        &mut self,
        id: usize,
        vx: f64,
        vy: f64,
        angular_speed: f64,
        curve_duration: f64,
    ) -> PyResult<()> {
        let handle = self.handle(id)?;
        let movement = WeavingMovement::new(CoreVec2::new(vx, vy), angular_speed, curve_duration)
            .map_err(value_error)?;
        if let Some(mut body) = self.inner.body_mut(handle) {
            body.set_movement(movement);
        }
        Ok(())
    }

    /// Queue a body for removal at the next step.
    fn remove(&mut self, id: usize) -> PyResult<bool> {
        let handle = self.handle(id)?;
        Ok(self.inner.remove_body(handle))
    }

    fn position(&self, id: usize) -> PyResult<Vec2> {
        let handle = self.handle(id)?;
        self.inner
            .body(handle)
            .map(|body| body.position().into())
            .ok_or_else(|| PyKeyError::new_err(id))
    }

    fn set_position(&mut self, id: usize, x: f64, y: f64) -> PyResult<()> {
        let handle = self.handle(id)?;
        if let Some(mut body) = self.inner.body_mut(handle) {
            body.set_position(CoreVec2::new(x, y));
        }
        Ok(())
    }

    /// Velocity of a body, or None if it is kinematic.
    fn velocity(&self, id: usize) -> PyResult<Option<Vec2>> {
        let handle = self.handle(id)?;
        Ok(self
            .inner
            .body(handle)
            .and_then(|body| body.velocity())
            .map(Vec2::from))
    }

    /// Request a new velocity, applied from the next step.
    fn set_velocity(&mut self, id: usize, vx: f64, vy: f64) -> PyResult<()> {
        let handle = self.handle(id)?;
        let movement = self
            .inner
            .body_mut(handle)
            .and_then(|mut body| body.movement_mut().map(|m| m.set_velocity(CoreVec2::new(vx, vy))));
        movement.ok_or_else(|| PyValueError::new_err("body is kinematic"))
    }

    fn set_active(&mut self, id: usize, active: bool) -> PyResult<()> {
        let handle = self.handle(id)?;
        if let Some(mut body) = self.inner.body_mut(handle) {
            body.set_active(active);
        }
        Ok(())
    }

    /// Advance by dt seconds.
    ///
    /// Returns the contacts that started this tick as `(kind, id_a, id_b)`
    /// where kind is "hit" or "overlap".
    fn step(&mut self, dt: f64) -> PyResult<Vec<(String, usize, usize)>> {
        let events = self.inner.step(dt).map_err(value_error)?;
        self.time += dt;

        let result: Vec<_> = events
            .into_iter()
            .filter_map(|event| {
                let a = self.id_of(event.contact.body_a())?;
                let b = self.id_of(event.contact.body_b())?;
                let kind = match event.kind {
                    ContactKind::Hit => "hit",
                    ContactKind::Overlap => "overlap",
                };
                Some((kind.to_string(), a, b))
            })
            .collect();

        // Removals are applied inside step
        let inner = &self.inner;
        self.ids.prune(|handle| inner.contains(handle));
        Ok(result)
    }

    /// Run multiple steps at once and return every event.
    fn step_n(&mut self, dt: f64, steps: usize) -> PyResult<Vec<(String, usize, usize)>> {
        let mut all = Vec::new();
        for _ in 0..steps {
            all.extend(self.step(dt)?);
        }
        Ok(all)
    }

    /// Ids of bodies currently in contact with `id`.
    fn touching(&self, id: usize) -> PyResult<Vec<usize>> {
        let handle = self.handle(id)?;
        Ok(self
            .inner
            .contacts()
            .filter_map(|contact| contact.other(handle).ok())
            .filter_map(|other| self.id_of(other))
            .collect())
    }
}

/// Python module definition.
#[pymodule]
fn phys2d(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Vec2>()?;
    m.add_class::<World>()?;
    Ok(())
}
