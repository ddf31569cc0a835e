use std::{env, fs::File, io::Write};

use cdt2d::{Cdt, Geometry, HPoint, IntegerGeometry, NONE};

const CANVAS_SIZE: f64 = 800.;
const POINT_SIZE: usize = 4;
const LINE_WIDTH: usize = 1;
const CONSTRAINT_WIDTH: usize = 3;
const INSIDE_COLOR: &str = "lightblue";
const LINE_COLOR: &str = "blue";
const CONSTRAINT_COLOR: &str = "red";
const POINT_COLOR: &str = "black";

/// Takes the first argument and use as path to load a polygon file, i.e. an
/// enclosing `rectangle` and a list of `polylines`. If no argument provided,
/// loads one of the test fixtures.
/// Example: cargo run --example svg -- tests/fixtures/star.json
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let default_path = "tests/fixtures/nested_squares.json".to_string();
    let args = env::args().collect::<Vec<String>>();
    let path = args.get(1).unwrap_or(&default_path);
    let value: serde_json::Value = serde_json::from_reader(File::open(path)?)?;

    let rectangle: Vec<i64> = value["rectangle"]
        .as_array()
        .ok_or("missing rectangle")?
        .iter()
        .filter_map(|c| c.as_i64())
        .collect();
    let &[x1, y1, x2, y2] = rectangle.as_slice() else {
        return Err("the rectangle needs 4 coordinates".into());
    };
    let mut cdt = Cdt::default();
    cdt.create_enclosing_rectangle(x1, y1, x2, y2)?;

    for polyline in value["polylines"].as_array().ok_or("missing polylines")? {
        let mut vertices = Vec::new();
        for p in polyline.as_array().ok_or("polyline is not an array")? {
            let (x, y) = (p[0].as_i64().ok_or("bad x")?, p[1].as_i64().ok_or("bad y")?);
            vertices.push(cdt.insert(HPoint::new(x, y))?);
        }
        if cdt.constraint_is_degenerate(&vertices) {
            println!("Skipping degenerate polyline {:?}", vertices);
            continue;
        }
        for w in vertices.windows(2) {
            if w[0] != w[1] {
                cdt.insert_constraint(w[0], w[1])?;
            }
        }
    }
    cdt.classify_triangles();
    println!(
        "{} vertices, {} triangles, {} constraints",
        cdt.nv(),
        cdt.nt(),
        cdt.ncnstr()
    );

    let points = scale(&cdt, [x1.min(x2), y1.min(y2), x1.max(x2), y1.max(y2)]);
    let contents = format!(
        r#"
<svg viewBox="0 0 {width} {height}" xmlns="http://www.w3.org/2000/svg">
<rect width="100%" height="100%" fill="white" />
    {triangles}
    {lines}
    {circles}
</svg>"#,
        width = CANVAS_SIZE,
        height = CANVAS_SIZE,
        triangles = render_triangles(&cdt, &points),
        lines = render_edges(&cdt, &points),
        circles = render_points(&cdt, &points),
    );
    File::create("triangulation.svg")?.write_all(contents.as_bytes())?;
    Ok(())
}

/// Maps the enclosing rectangle to the canvas, y axis pointing up.
fn scale(cdt: &Cdt<IntegerGeometry>, [x1, y1, x2, y2]: [i64; 4]) -> Vec<(f64, f64)> {
    let factor = CANVAS_SIZE / ((x2 - x1).max(y2 - y1).max(1) as f64);
    (0..cdt.nv())
        .map(|v| {
            let [x, y] = cdt.geometry().coordinates(v);
            ((x - x1 as f64) * factor, CANVAS_SIZE - (y - y1 as f64) * factor)
        })
        .collect()
}

fn render_triangles(cdt: &Cdt<IntegerGeometry>, points: &[(f64, f64)]) -> String {
    (0..cdt.nt())
        .filter(|&t| cdt.is_inside(t))
        .fold(String::new(), |acc, t| {
            let corners = cdt.mesh().vertices(t).map(|v| format!("{},{}", points[v].0, points[v].1));
            acc + &format!(r#"<polygon points="{}" fill="{}" />"#, corners.join(" "), INSIDE_COLOR)
        })
}

fn render_edges(cdt: &Cdt<IntegerGeometry>, points: &[(f64, f64)]) -> String {
    let mut lines = String::new();
    for t in 0..cdt.nt() {
        for le in 0..3 {
            let t2 = cdt.adjacent(t, le);
            // Each inner edge is drawn from its lower triangle only.
            if t2 != NONE && t2 < t {
                continue;
            }
            let start = points[cdt.vertex(t, (le + 1) % 3)];
            let end = points[cdt.vertex(t, (le + 2) % 3)];
            let (color, width) = if cdt.is_region_boundary(t, le) {
                (CONSTRAINT_COLOR, CONSTRAINT_WIDTH)
            } else {
                (LINE_COLOR, LINE_WIDTH)
            };
            lines += &format!(
                r#"<line x1="{x0}" y1="{y0}" x2="{x1}" y2="{y1}" style="stroke:{color};stroke-width:{width}" />"#,
                x0 = start.0,
                y0 = start.1,
                x1 = end.0,
                y1 = end.1,
            );
        }
    }
    lines
}

fn render_points(cdt: &Cdt<IntegerGeometry>, points: &[(f64, f64)]) -> String {
    let mut circles = String::new();
    for (v, p) in points.iter().enumerate() {
        if cdt.vertex_triangle(v) == NONE {
            continue;
        }
        circles += &format!(r#"<circle cx="{}" cy="{}" r="{}" fill="{}"/>"#, p.0, p.1, POINT_SIZE, POINT_COLOR);
        // show ids for points if input is relatively small
        if points.len() < 100 {
            circles += &format!(r#"<text x="{}" y="{}" font-size="20" fill="black">{}</text>"#, p.0 + 10., p.1 - 5., v);
        }
    }
    circles
}
