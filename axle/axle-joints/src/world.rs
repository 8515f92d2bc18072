//! Reference world: body store, step loop, deferred structural changes.
//!
//! The world owns the arenas, runs one row-submission call per connected
//! joint per step, hands the batch to the reference solver, runs the
//! breaking-force monitor on the resolved forces, and integrates bodies.
//! Structural mutation never happens inside the step's submission or
//! solve: breaking-force teardown goes through a pending-disconnect
//! queue drained at the start of the next step.

use axle_types::{Frame, JointError, Result, Vector3};
use nalgebra::UnitQuaternion;
use tracing::{debug, warn};

use crate::arena::Arena;
use crate::body::{Body, BodyId};
use crate::joint::{Joint, JointId, JointKind, LimitDescriptor};
use crate::row::RowBatch;
use crate::skeleton::{BoneIndex, SkeletonContainer, SkeletonId, SkeletonSolverMode};
use crate::solver::RowSolver;

/// Lifecycle notifications drained with [`JointWorld::take_events`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JointEvent {
    /// A joint was connected to a child body.
    Connected(JointId),
    /// A joint was disconnected through the API.
    Disconnected(JointId),
    /// A joint was torn down by the breaking-force monitor.
    Broken(JointId),
    /// The bodies-collidable flag changed.
    CollidableChanged(JointId, bool),
    /// The stiffness changed (carries the clamped value).
    StiffnessChanged(JointId, f64),
    /// The pin frame was replaced.
    PinChanged(JointId),
}

/// The joint world: bodies, joints, skeletons and the step loop.
pub struct JointWorld {
    bodies: Arena<Body>,
    joints: Arena<Joint>,
    skeletons: Arena<SkeletonContainer>,
    solver: RowSolver,
    dt: f64,
    gravity: Vector3<f64>,
    pending_disconnect: Vec<JointId>,
    events: Vec<JointEvent>,
    steps: u64,
}

impl Default for JointWorld {
    fn default() -> Self {
        Self::new(1.0 / 60.0)
    }
}

impl JointWorld {
    /// Create a world with the given timestep (clamped to > 0).
    #[must_use]
    pub fn new(dt: f64) -> Self {
        Self {
            bodies: Arena::new(),
            joints: Arena::new(),
            skeletons: Arena::new(),
            solver: RowSolver::default(),
            dt: dt.max(1e-6),
            gravity: Vector3::zeros(),
            pending_disconnect: Vec::new(),
            events: Vec::new(),
            steps: 0,
        }
    }

    /// The physics timestep in seconds.
    #[must_use]
    pub fn timestep(&self) -> f64 {
        self.dt
    }

    /// Set the physics timestep (clamped to > 0).
    pub fn set_timestep(&mut self, dt: f64) {
        self.dt = dt.max(1e-6);
    }

    /// Gravity applied to every dynamic body (m/s²).
    #[must_use]
    pub fn gravity(&self) -> Vector3<f64> {
        self.gravity
    }

    /// Set gravity.
    pub fn set_gravity(&mut self, gravity: Vector3<f64>) {
        self.gravity = gravity;
    }

    /// The reference solver.
    #[must_use]
    pub fn solver(&self) -> &RowSolver {
        &self.solver
    }

    /// Mutable access to the reference solver.
    pub fn solver_mut(&mut self) -> &mut RowSolver {
        &mut self.solver
    }

    /// Number of steps taken.
    #[must_use]
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    // ------------------------------------------------------------------
    // Bodies
    // ------------------------------------------------------------------

    /// Add a body, returning its handle.
    pub fn add_body(&mut self, body: Body) -> BodyId {
        self.bodies.insert(body)
    }

    /// Resolve a body handle.
    pub fn body(&self, id: BodyId) -> Result<&Body> {
        self.bodies.get(id).ok_or(JointError::StaleBody)
    }

    /// Resolve a body handle mutably.
    pub fn body_mut(&mut self, id: BodyId) -> Result<&mut Body> {
        self.bodies.get_mut(id).ok_or(JointError::StaleBody)
    }

    /// Whether a body handle is live.
    #[must_use]
    pub fn body_valid(&self, id: BodyId) -> bool {
        self.bodies.contains(id)
    }

    /// Remove a body. Joints attached to it are disconnected first.
    pub fn remove_body(&mut self, id: BodyId) -> Result<Body> {
        let body = self.bodies.remove(id).ok_or(JointError::StaleBody)?;

        let mut dropped = Vec::new();
        for (joint_id, joint) in self.joints.iter_mut() {
            let touches = joint.child() == Some(id) || joint.parent() == Some(id);
            if joint.connected() && touches {
                joint.disconnect_now();
                dropped.push(joint_id);
            }
        }
        for joint_id in dropped {
            self.events.push(JointEvent::Disconnected(joint_id));
        }
        Ok(body)
    }

    // ------------------------------------------------------------------
    // Joint lifecycle
    // ------------------------------------------------------------------

    /// Create a detached joint.
    ///
    /// `pin_world` is given in world coordinates and stored relative to
    /// the parent (or as-is when parentless), so later re-pinning or
    /// parent motion needs no fixup. The frame is orthonormalized before
    /// storage.
    pub fn create_joint(
        &mut self,
        kind: JointKind,
        parent: Option<BodyId>,
        pin_world: Frame,
    ) -> Result<JointId> {
        if !pin_world.is_finite() {
            return Err(JointError::NonFinite("pin frame"));
        }
        let pin_parent = match parent {
            Some(parent_id) => {
                let parent_frame = self.body(parent_id)?.frame();
                pin_world.relative_to(parent_frame)
            }
            None => pin_world,
        };
        let id = self.joints.insert(Joint::new(kind, parent, pin_parent));
        debug!(joint = ?id, kind = self.joints.get(id).map_or("?", |j| j.kind().name()), "joint created");
        Ok(id)
    }

    /// Connect a joint to its child body.
    ///
    /// Both handles must belong to this world (the arenas make a
    /// cross-world mix resolve as stale). Fails when already connected
    /// or when the child is the joint's own parent. Local frames are
    /// computed here, exactly once.
    pub fn connect(&mut self, joint_id: JointId, child: BodyId) -> Result<()> {
        let (parent_id, already_connected) = {
            let joint = self.joint(joint_id)?;
            (joint.parent(), joint.connected())
        };
        if already_connected {
            return Err(JointError::AlreadyConnected);
        }
        if parent_id == Some(child) {
            return Err(JointError::SelfParenting);
        }

        let child_frame = *self.body(child)?.frame();
        let parent_frame = match parent_id {
            Some(parent_id) => Some(*self.body(parent_id)?.frame()),
            None => None,
        };

        let joint = self
            .joints
            .get_mut(joint_id)
            .ok_or(JointError::StaleJoint)?;
        joint.connect_with(child, &child_frame, parent_frame.as_ref());
        self.events.push(JointEvent::Connected(joint_id));
        debug!(joint = ?joint_id, "joint connected");
        Ok(())
    }

    /// Disconnect a joint from its child.
    pub fn disconnect(&mut self, joint_id: JointId) -> Result<()> {
        let joint = self
            .joints
            .get_mut(joint_id)
            .ok_or(JointError::StaleJoint)?;
        if !joint.connected() {
            return Err(JointError::NotConnected);
        }
        joint.disconnect_now();
        self.events.push(JointEvent::Disconnected(joint_id));
        debug!(joint = ?joint_id, "joint disconnected");
        Ok(())
    }

    /// Destroy a joint, disconnecting it first when needed.
    pub fn destroy_joint(&mut self, joint_id: JointId) -> Result<()> {
        let was_connected = self.joint(joint_id)?.connected();
        if was_connected {
            self.events.push(JointEvent::Disconnected(joint_id));
        }
        self.joints.remove(joint_id).ok_or(JointError::StaleJoint)?;
        self.pending_disconnect.retain(|id| *id != joint_id);
        Ok(())
    }

    /// Resolve a joint handle.
    pub fn joint(&self, id: JointId) -> Result<&Joint> {
        self.joints.get(id).ok_or(JointError::StaleJoint)
    }

    /// Resolve a joint handle mutably.
    pub fn joint_mut(&mut self, id: JointId) -> Result<&mut Joint> {
        self.joints.get_mut(id).ok_or(JointError::StaleJoint)
    }

    /// Whether a joint handle is live and connected.
    #[must_use]
    pub fn connected(&self, id: JointId) -> bool {
        self.joints.get(id).is_some_and(Joint::connected)
    }

    /// Whether a joint handle is live.
    #[must_use]
    pub fn joint_valid(&self, id: JointId) -> bool {
        self.joints.contains(id)
    }

    /// The joint's current global frame.
    ///
    /// While connected this derives from the cached child-side local
    /// frame, never from the pin frame; detached joints report the pin
    /// frame composed with the parent's current frame.
    pub fn joint_frame(&self, id: JointId) -> Result<Frame> {
        let joint = self.joint(id)?;
        if let Some(child_id) = joint.child() {
            let child = self.body(child_id)?;
            let (local_child, _) = joint.local_frames();
            return Ok(child.frame().compose(local_child));
        }
        match joint.parent() {
            Some(parent_id) => Ok(self.body(parent_id)?.frame().compose(joint.pin_frame())),
            None => Ok(*joint.pin_frame()),
        }
    }

    /// Replace a joint's pin frame (world coordinates). Recomputes the
    /// local frames when connected and fires `PinChanged`.
    pub fn set_pin_frame(&mut self, joint_id: JointId, pin_world: Frame) -> Result<()> {
        if !pin_world.is_finite() {
            return Err(JointError::NonFinite("pin frame"));
        }
        let (parent_id, child_id) = {
            let joint = self.joint(joint_id)?;
            (joint.parent(), joint.child())
        };

        let parent_frame = match parent_id {
            Some(parent_id) => Some(*self.body(parent_id)?.frame()),
            None => None,
        };
        let pin_parent = parent_frame.map_or(pin_world, |f| pin_world.relative_to(&f));
        let child_frame = match child_id {
            Some(child_id) => Some(*self.body(child_id)?.frame()),
            None => None,
        };

        let joint = self
            .joints
            .get_mut(joint_id)
            .ok_or(JointError::StaleJoint)?;
        joint.set_pin(pin_parent, child_frame.as_ref(), parent_frame.as_ref());
        self.events.push(JointEvent::PinChanged(joint_id));
        Ok(())
    }

    /// Set the bodies-collidable flag, firing `CollidableChanged`.
    pub fn set_collidable(&mut self, joint_id: JointId, collidable: bool) -> Result<()> {
        let joint = self
            .joints
            .get_mut(joint_id)
            .ok_or(JointError::StaleJoint)?;
        if joint.collidable() != collidable {
            joint.set_collidable_flag(collidable);
            self.events
                .push(JointEvent::CollidableChanged(joint_id, collidable));
        }
        Ok(())
    }

    /// Set the stiffness (clamped to [0, 1]), firing `StiffnessChanged`
    /// with the clamped value.
    pub fn set_stiffness(&mut self, joint_id: JointId, stiffness: f64) -> Result<()> {
        let joint = self
            .joints
            .get_mut(joint_id)
            .ok_or(JointError::StaleJoint)?;
        joint.set_stiffness(stiffness);
        let clamped = joint.stiffness();
        self.events
            .push(JointEvent::StiffnessChanged(joint_id, clamped));
        Ok(())
    }

    /// Degree-of-freedom bounds of a joint, for solver diagnostics.
    pub fn describe_limits(&self, joint_id: JointId) -> Result<Vec<LimitDescriptor>> {
        Ok(self.joint(joint_id)?.kind().describe_limits())
    }

    /// Joints queued for breaking-force teardown, applied at the start
    /// of the next step.
    #[must_use]
    pub fn pending_disconnects(&self) -> &[JointId] {
        &self.pending_disconnect
    }

    /// Drain the lifecycle events collected since the last call.
    pub fn take_events(&mut self) -> Vec<JointEvent> {
        std::mem::take(&mut self.events)
    }

    // ------------------------------------------------------------------
    // Skeletons
    // ------------------------------------------------------------------

    /// Create a skeleton rooted at `root`.
    pub fn create_skeleton(&mut self, root: BodyId) -> Result<SkeletonId> {
        if !self.bodies.contains(root) {
            return Err(JointError::StaleBody);
        }
        Ok(self.skeletons.insert(SkeletonContainer::new(root)))
    }

    /// Resolve a skeleton handle.
    pub fn skeleton(&self, id: SkeletonId) -> Result<&SkeletonContainer> {
        self.skeletons.get(id).ok_or(JointError::StaleSkeleton)
    }

    /// Whether a skeleton handle is live.
    #[must_use]
    pub fn skeleton_valid(&self, id: SkeletonId) -> bool {
        self.skeletons.contains(id)
    }

    /// Attach a body under an existing bone.
    pub fn attach_bone(
        &mut self,
        skeleton_id: SkeletonId,
        body: BodyId,
        parent: BoneIndex,
    ) -> Result<BoneIndex> {
        if !self.bodies.contains(body) {
            return Err(JointError::StaleBody);
        }
        self.skeletons
            .get_mut(skeleton_id)
            .ok_or(JointError::StaleSkeleton)?
            .attach_bone(body, parent)
    }

    /// Finalize a skeleton for the solver.
    pub fn finalize_skeleton(&mut self, id: SkeletonId) -> Result<()> {
        self.skeletons
            .get_mut(id)
            .ok_or(JointError::StaleSkeleton)?
            .finalize();
        Ok(())
    }

    /// Set a skeleton's solver mode hint.
    pub fn set_skeleton_solver_mode(
        &mut self,
        id: SkeletonId,
        mode: SkeletonSolverMode,
    ) -> Result<()> {
        self.skeletons
            .get_mut(id)
            .ok_or(JointError::StaleSkeleton)?
            .set_solver_mode(mode);
        Ok(())
    }

    /// Destroy a skeleton.
    pub fn destroy_skeleton(&mut self, id: SkeletonId) -> Result<()> {
        self.skeletons
            .remove(id)
            .map(|_| ())
            .ok_or(JointError::StaleSkeleton)
    }

    // ------------------------------------------------------------------
    // Step loop
    // ------------------------------------------------------------------

    /// Advance the world by one timestep.
    ///
    /// Order: drain the pending-disconnect queue, submit rows (one call
    /// per connected joint), apply deferred forces and gravity to
    /// velocities, solve, run the breaking-force monitor, integrate
    /// positions.
    pub fn step(&mut self) {
        self.drain_pending();

        let dt = self.dt;
        let mut batch = RowBatch::new(dt);

        // Row submission. Body kinematics are read-only here; joints may
        // append to the deferred force accumulators only.
        {
            let joints = &mut self.joints;
            let bodies = &self.bodies;
            for (joint_id, joint) in joints.iter_mut() {
                if !joint.connected() {
                    continue;
                }
                // Stale ranges must not leak into this step's monitor.
                joint.row_range = 0..0;
                let Some(child_id) = joint.child() else {
                    continue;
                };
                let Some(child) = bodies.get(child_id) else {
                    warn!(joint = ?joint_id, "child body vanished, skipping submission");
                    continue;
                };
                let parent = joint.parent().and_then(|id| bodies.get(id));
                if joint.parent().is_some() && parent.is_none() {
                    warn!(joint = ?joint_id, "parent body vanished, skipping submission");
                    continue;
                }

                let start = batch.begin_joint(child_id, joint.parent());
                joint.submit_rows(&mut batch, child, parent, dt);
                joint.row_range = start..batch.len();
            }
        }

        // Deferred forces and gravity, applied once per body per step.
        let gravity = self.gravity;
        for (_, body) in self.bodies.iter_mut() {
            let (force, torque) = body.take_accumulators();
            if body.is_static() {
                continue;
            }
            let inv_mass = body.inverse_mass();
            let inv_inertia = body.inverse_inertia_world();
            let state = body.state_mut();
            state.twist.linear += (force * inv_mass + gravity) * dt;
            state.twist.angular += inv_inertia * torque * dt;
        }

        self.solver.solve(&mut batch, &mut self.bodies);

        // Breaking-force monitor: runs on the resolved forces, queues
        // teardown for the next drain (no structural change mid-step).
        {
            let rows = batch.rows();
            let pending = &mut self.pending_disconnect;
            for (joint_id, joint) in self.joints.iter_mut() {
                if !joint.connected() {
                    continue;
                }
                let max_force = rows[joint.row_range.clone()]
                    .iter()
                    .map(|row| row.resolved_force().abs())
                    .fold(0.0, f64::max);
                joint.last_row_force = max_force;

                let threshold = joint.breaking_force();
                if threshold > 0.0 && max_force > threshold && !pending.contains(&joint_id) {
                    warn!(joint = ?joint_id, force = max_force, threshold, "breaking force exceeded");
                    pending.push(joint_id);
                }
            }
        }

        // Semi-implicit Euler position update.
        for (_, body) in self.bodies.iter_mut() {
            if body.is_static() {
                continue;
            }
            let state = body.state_mut();
            let twist = state.twist;
            state.frame.position += twist.linear * dt;
            state.frame.rotation =
                UnitQuaternion::from_scaled_axis(twist.angular * dt) * state.frame.rotation;
        }

        self.steps += 1;
    }

    /// Apply the queued breaking-force teardowns.
    fn drain_pending(&mut self) {
        if self.pending_disconnect.is_empty() {
            return;
        }
        let queued = std::mem::take(&mut self.pending_disconnect);
        for joint_id in queued {
            if let Some(joint) = self.joints.get_mut(joint_id) {
                if joint.connected() {
                    joint.disconnect_now();
                    self.events.push(JointEvent::Broken(joint_id));
                    debug!(joint = ?joint_id, "broken joint disconnected");
                }
            }
        }
    }
}
