//! Places typed values and arrays inside a pool.

use blockpool::FixedPool;

#[derive(Debug, Default)]
struct Point {
    x: f32,
    y: f32,
}

fn main() -> Result<(), blockpool::PoolError> {
    let mut pool = FixedPool::new(1024, 64)?;

    let Some(mut point) = pool.construct(Point { x: 12.0, y: 25.0 }) else {
        println!("no room for a point");
        return Ok(());
    };
    println!("constructed {:?} in {} bytes", pool.get(&point), point.block().size());

    if let Some(p) = pool.get_mut(&point) {
        p.x += 1.0;
    }
    println!("moved to {:?}", pool.get(&point));

    let Some(mut points) = pool.construct_array_with(10, |i| Point {
        x: i as f32,
        y: (i * i) as f32,
    }) else {
        println!("no room for the array");
        return Ok(());
    };
    println!(
        "array of {} points spans {} bytes",
        points.len(),
        points.block().size()
    );
    if let Some(slice) = pool.get_slice(&points) {
        for p in slice {
            println!("  ({}, {})", p.x, p.y);
        }
    }

    pool.destruct_array(&mut points);
    pool.destruct(&mut point);
    println!("destructed, {} bytes in use", pool.used_size());

    Ok(())
}
