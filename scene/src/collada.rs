//! Collada 1.4.1 writer for a single mesh object.

use {
    crate::{mesh::TriMesh, SceneError},
    nalgebra as na,
    quick_xml::{
        events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
        Writer,
    },
    std::{fmt::Write as _, io::Write},
};

const SCHEMA: &str = "http://www.collada.org/2005/11/COLLADASchema";

/// Writes `mesh` in its local frame, placed by `transform` in the scene.
pub fn write_collada<W: Write>(
    writer: W,
    name: &str,
    mesh: &TriMesh,
    transform: &na::Matrix4<f32>,
) -> Result<(), SceneError> {
    let id = xml_id(name);
    let mesh_id = format!("{}-mesh", id);
    let positions_id = format!("{}-positions", mesh_id);
    let normals_id = format!("{}-normals", mesh_id);
    let vertices_id = format!("{}-vertices", mesh_id);

    let mut positions = Vec::with_capacity(mesh.len() * 9);
    let mut normals = Vec::with_capacity(mesh.len() * 3);
    for triangle in &mesh.triangles {
        for vertex in &triangle.vertices {
            positions.extend_from_slice(vertex.coords.as_slice());
        }
        normals.extend_from_slice(triangle.normal.as_slice());
    }

    let mut indices = String::new();
    for t in 0..mesh.len() {
        for v in 0..3 {
            if !indices.is_empty() {
                indices.push(' ');
            }
            let _ = write!(indices, "{} {}", t * 3 + v, t);
        }
    }

    let mut matrix = Vec::with_capacity(16);
    for row in 0..4 {
        for column in 0..4 {
            matrix.push(transform[(row, column)]);
        }
    }

    let mut xml = Xml {
        writer: Writer::new_with_indent(writer, b' ', 2),
    };

    xml.writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;
    xml.open("COLLADA", &[("xmlns", SCHEMA), ("version", "1.4.1")])?;

    xml.open("asset", &[])?;
    xml.open("contributor", &[])?;
    xml.text_element("authoring_tool", "linkmesh")?;
    xml.close("contributor")?;
    xml.empty("unit", &[("name", "meter"), ("meter", "1")])?;
    xml.text_element("up_axis", "Z_UP")?;
    xml.close("asset")?;

    xml.open("library_geometries", &[])?;
    xml.open("geometry", &[("id", mesh_id.as_str()), ("name", name)])?;
    xml.open("mesh", &[])?;
    xml.float_source(&positions_id, &positions)?;
    xml.float_source(&normals_id, &normals)?;
    xml.open("vertices", &[("id", vertices_id.as_str())])?;
    xml.empty(
        "input",
        &[("semantic", "POSITION"), ("source", format!("#{}", positions_id).as_str())],
    )?;
    xml.close("vertices")?;
    xml.open("triangles", &[("count", mesh.len().to_string().as_str())])?;
    xml.empty(
        "input",
        &[
            ("semantic", "VERTEX"),
            ("source", format!("#{}", vertices_id).as_str()),
            ("offset", "0"),
        ],
    )?;
    xml.empty(
        "input",
        &[
            ("semantic", "NORMAL"),
            ("source", format!("#{}", normals_id).as_str()),
            ("offset", "1"),
        ],
    )?;
    xml.text_element("p", &indices)?;
    xml.close("triangles")?;
    xml.close("mesh")?;
    xml.close("geometry")?;
    xml.close("library_geometries")?;

    xml.open("library_visual_scenes", &[])?;
    xml.open("visual_scene", &[("id", "Scene"), ("name", "Scene")])?;
    xml.open("node", &[("id", id.as_str()), ("name", name), ("type", "NODE")])?;
    xml.open("matrix", &[("sid", "transform")])?;
    xml.text(&join(&matrix))?;
    xml.close("matrix")?;
    xml.empty(
        "instance_geometry",
        &[("url", format!("#{}", mesh_id).as_str()), ("name", name)],
    )?;
    xml.close("node")?;
    xml.close("visual_scene")?;
    xml.close("library_visual_scenes")?;

    xml.open("scene", &[])?;
    xml.empty("instance_visual_scene", &[("url", "#Scene")])?;
    xml.close("scene")?;

    xml.close("COLLADA")?;

    xml.writer.into_inner().flush()?;
    Ok(())
}

struct Xml<W> {
    writer: Writer<W>,
}

impl<W: Write> Xml<W> {
    fn open(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), SceneError> {
        self.writer.write_event(Event::Start(
            BytesStart::new(name).with_attributes(attrs.iter().copied()),
        ))?;
        Ok(())
    }

    fn empty(&mut self, name: &str, attrs: &[(&str, &str)]) -> Result<(), SceneError> {
        self.writer.write_event(Event::Empty(
            BytesStart::new(name).with_attributes(attrs.iter().copied()),
        ))?;
        Ok(())
    }

    fn close(&mut self, name: &str) -> Result<(), SceneError> {
        self.writer.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), SceneError> {
        self.writer.write_event(Event::Text(BytesText::new(text)))?;
        Ok(())
    }

    fn text_element(&mut self, name: &str, text: &str) -> Result<(), SceneError> {
        self.open(name, &[])?;
        self.text(text)?;
        self.close(name)
    }

    fn float_source(&mut self, id: &str, values: &[f32]) -> Result<(), SceneError> {
        let array_id = format!("{}-array", id);
        let count = values.len().to_string();
        let stride = 3;

        self.open("source", &[("id", id)])?;
        self.open("float_array", &[("id", array_id.as_str()), ("count", count.as_str())])?;
        self.text(&join(values))?;
        self.close("float_array")?;
        self.open("technique_common", &[])?;
        self.open(
            "accessor",
            &[
                ("source", format!("#{}", array_id).as_str()),
                ("count", (values.len() / stride).to_string().as_str()),
                ("stride", stride.to_string().as_str()),
            ],
        )?;
        for param in &["X", "Y", "Z"] {
            self.empty("param", &[("name", *param), ("type", "float")])?;
        }
        self.close("accessor")?;
        self.close("technique_common")?;
        self.close("source")
    }
}

fn join(values: &[f32]) -> String {
    let mut out = String::with_capacity(values.len() * 8);
    for (index, value) in values.iter().enumerate() {
        if index > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{}", value);
    }
    out
}

/// Collada ids are xs:ID: no spaces, first char a letter or `_`.
fn xml_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len() + 1);
    if !name.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_') {
        id.push('_');
    }
    id.extend(
        name.chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' }),
    );
    id
}
