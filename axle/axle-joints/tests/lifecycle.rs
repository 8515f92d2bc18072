//! Joint lifecycle integration tests.
//!
//! Covers: connect/disconnect validation, telemetry reset across a
//! reconnect, documented setter clamping, limit descriptions, and
//! handle staleness after destruction.

#![allow(clippy::unwrap_used)]

use approx::assert_relative_eq;
use axle_joints::{
    Body, BodyState, DofKind, Frame, Hinge, JointError, JointEvent, JointKind, JointWorld,
    MassProperties, Motor,
};
use nalgebra::{Point3, Vector3};

fn world_with_body() -> (JointWorld, axle_joints::BodyId) {
    let mut world = JointWorld::new(1.0 / 60.0);
    let body = world.add_body(Body::new(
        BodyState::default(),
        MassProperties::sphere(1.0, 0.5),
    ));
    (world, body)
}

#[test]
fn reconnect_resets_telemetry() {
    let (mut world, body) = world_with_body();
    let joint = world
        .create_joint(
            JointKind::Motor(Motor::new().with_target_speed(2.0)),
            None,
            Frame::identity(),
        )
        .unwrap();
    world.connect(joint, body).unwrap();

    // Spin for a while so telemetry carries real values.
    for _ in 0..30 {
        world.step();
    }
    let angle = world.joint(joint).unwrap().kind().as_motor().unwrap().angle();
    assert!(angle > 0.1);

    // Disconnect then reconnect: position/velocity/acceleration all zero.
    world.disconnect(joint).unwrap();
    world.connect(joint, body).unwrap();

    let motor = world.joint(joint).unwrap().kind().as_motor().unwrap().clone();
    assert_relative_eq!(motor.angle(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(motor.telemetry().position(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(motor.telemetry().velocity(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(motor.telemetry().acceleration(), 0.0, epsilon = 1e-12);
}

#[test]
fn stiffness_setter_clamps_to_unit_range() {
    let (mut world, body) = world_with_body();
    let joint = world
        .create_joint(JointKind::Hinge(Hinge::new()), None, Frame::identity())
        .unwrap();
    world.connect(joint, body).unwrap();

    world.set_stiffness(joint, 5.0).unwrap();
    assert_relative_eq!(world.joint(joint).unwrap().stiffness(), 1.0, epsilon = 1e-12);

    world.set_stiffness(joint, -1.0).unwrap();
    assert_relative_eq!(world.joint(joint).unwrap().stiffness(), 0.0, epsilon = 1e-12);

    let events = world.take_events();
    assert!(events.contains(&JointEvent::StiffnessChanged(joint, 1.0)));
    assert!(events.contains(&JointEvent::StiffnessChanged(joint, 0.0)));
}

#[test]
fn describe_limits_bridges_kind_bounds() {
    let (mut world, _body) = world_with_body();
    let joint = world
        .create_joint(
            JointKind::Hinge(Hinge::new().with_limits(-0.4, 0.9)),
            None,
            Frame::identity(),
        )
        .unwrap();

    let limits = world.describe_limits(joint).unwrap();
    assert_eq!(limits.len(), 1);
    assert_eq!(limits[0].kind, DofKind::Angular);
    assert_relative_eq!(limits[0].min, -0.4, epsilon = 1e-12);
    assert_relative_eq!(limits[0].max, 0.9, epsilon = 1e-12);

    // Unlimited joints describe nothing.
    let free = world
        .create_joint(JointKind::Hinge(Hinge::new()), None, Frame::identity())
        .unwrap();
    assert!(world.describe_limits(free).unwrap().is_empty());
}

#[test]
fn destroyed_joint_handle_goes_stale() {
    let (mut world, body) = world_with_body();
    let joint = world
        .create_joint(JointKind::Hinge(Hinge::new()), None, Frame::identity())
        .unwrap();
    world.connect(joint, body).unwrap();
    world.destroy_joint(joint).unwrap();

    assert!(!world.joint_valid(joint));
    assert_eq!(world.joint(joint).err(), Some(JointError::StaleJoint));
    assert_eq!(world.connect(joint, body), Err(JointError::StaleJoint));

    // The world keeps stepping without the destroyed joint.
    world.step();
}

#[test]
fn pin_frame_is_stored_parent_relative() {
    let mut world = JointWorld::new(1.0 / 60.0);
    let parent = world.add_body(Body::new(
        BodyState::at_rest(Frame::from_position(Point3::new(1.0, 0.0, 0.0))),
        MassProperties::sphere(1.0, 0.5),
    ));
    let child = world.add_body(Body::new(
        BodyState::at_rest(Frame::from_position(Point3::new(2.0, 0.0, 0.0))),
        MassProperties::sphere(1.0, 0.5),
    ));

    let pin_world = Frame::from_position(Point3::new(1.5, 0.0, 0.0));
    let joint = world
        .create_joint(JointKind::Hinge(Hinge::new()), Some(parent), pin_world)
        .unwrap();

    // Stored relative to the parent at (1,0,0).
    assert_relative_eq!(
        world.joint(joint).unwrap().pin_frame().position.x,
        0.5,
        epsilon = 1e-12
    );

    world.connect(joint, child).unwrap();
    let frame = world.joint_frame(joint).unwrap();
    assert_relative_eq!(frame.position.x, 1.5, epsilon = 1e-12);
}

#[test]
fn set_pin_frame_fires_event_and_recomputes() {
    let (mut world, body) = world_with_body();
    let joint = world
        .create_joint(JointKind::Hinge(Hinge::new()), None, Frame::identity())
        .unwrap();
    world.connect(joint, body).unwrap();
    let _ = world.take_events();

    let new_pin = Frame::from_position(Point3::new(0.0, 1.0, 0.0));
    world.set_pin_frame(joint, new_pin).unwrap();

    assert!(world.take_events().contains(&JointEvent::PinChanged(joint)));
    assert_relative_eq!(
        world.joint(joint).unwrap().pin_frame().position.y,
        1.0,
        epsilon = 1e-12
    );
}

#[test]
fn non_finite_pin_rejected() {
    let (mut world, _body) = world_with_body();
    let bad = Frame::from_position(Point3::new(f64::NAN, 0.0, 0.0));
    assert_eq!(
        world
            .create_joint(JointKind::Hinge(Hinge::new()), None, bad)
            .err(),
        Some(JointError::NonFinite("pin frame"))
    );
}

#[test]
fn up_vector_keeps_translation_free() {
    // An up-vector joint must not pin the body in space: give the body a
    // sideways velocity and confirm it keeps translating while staying
    // upright-constrained.
    let mut world = JointWorld::new(1.0 / 60.0);
    let body = world.add_body(Body::new(
        BodyState::new(
            Frame::identity(),
            axle_joints::Twist::new(Vector3::new(1.0, 0.0, 0.0), Vector3::zeros()),
        ),
        MassProperties::sphere(1.0, 0.5),
    ));
    let joint = world
        .create_joint(
            JointKind::UpVector(axle_joints::UpVector::new(Vector3::x())),
            None,
            Frame::identity(),
        )
        .unwrap();
    world.connect(joint, body).unwrap();

    for _ in 0..60 {
        world.step();
    }
    let x = world.body(body).unwrap().frame().position.x;
    assert_relative_eq!(x, 1.0, epsilon = 1e-6);
}
