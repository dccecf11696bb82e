use std::f64::consts::PI;

use tread_kinematics::*;

/// Minimal planar pose: `heading` grows when the robot turns left.
#[derive(Debug, Default)]
struct FloorPose {
    x: f64,
    z: f64,
    heading: f64,
}

impl PoseSink for FloorPose {
    fn move_by(&mut self, dx: f64, _dy: f64, dz: f64) {
        let (s, c) = self.heading.sin_cos();
        self.x += dx * c - dz * s;
        self.z += dx * s + dz * c;
    }

    fn rotate_by(&mut self, _axis_x: f64, axis_y: f64, _axis_z: f64, angle: f64) {
        self.heading += axis_y * angle;
    }
}

fn main() {
    let wheel_span = 2.0;
    let wheel_diameter = 1.0;
    let geometry_result = WheelGeometry::new(wheel_span, wheel_diameter);

    // Left wheel twice as fast as the right: a quarter circle of radius 3 per tick.
    let deltas = WheelDeltas::new(2.0, 1.0);
    let num_steps = 4;
    let mut pose = FloorPose::default();

    match geometry_result {
        Ok(geometry) => {
            let kinematics = DifferentialDrive::new(geometry);
            println!("Initializing simulation...");
            println!("  {}", kinematics);
            println!("  Wheel deltas per tick: {}", deltas);
            println!("  Num Steps:    {}", num_steps);
            println!("\nSimulating...");

            for i in 0..num_steps {
                match kinematics.apply(deltas, &mut pose) {
                    Ok(motion) => {
                        println!(
                            "Step {:>2}: motion {} -> (x: {:.3}, z: {:.3}, heading: {:.3} rad)",
                            i + 1, motion, pose.x, pose.z, pose.heading
                        );
                    }
                    Err(e) => {
                        eprintln!("Error during simulation step {}: {}", i + 1, e);
                        break;
                    }
                }
            }

            println!("\nSimulation complete.");
            println!("Final pose: {:?} (one full turn is {:.3} rad)", pose, -2.0 * PI);
        }
        Err(e) => {
            eprintln!("Failed to initialize kinematics: {}", e);
            eprintln!("Please ensure wheel_span ({}) and wheel_diameter ({}) are positive.", wheel_span, wheel_diameter);
        }
    }
}
