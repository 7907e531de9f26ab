use {
    byteorder::{LittleEndian, ReadBytesExt as _, WriteBytesExt as _},
    nalgebra as na,
    serde::{Deserialize, Serialize},
    std::{
        convert::TryFrom as _,
        io::{self, Read, Write},
    },
};

const STL_HEADER_LEN: usize = 80;
const STL_TRIANGLE_LEN: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum StlError {
    #[error("{source}")]
    Io {
        #[from]
        source: io::Error,
    },

    #[error("Binary STL is truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("Malformed ASCII STL at facet {facet}: {message}")]
    Ascii { facet: usize, message: &'static str },

    #[error("STL has too many triangles to be written")]
    TooLarge,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Triangle {
    pub normal: na::Vector3<f32>,
    pub vertices: [na::Point3<f32>; 3],
}

impl Triangle {
    pub fn new(vertices: [na::Point3<f32>; 3]) -> Self {
        let mut triangle = Triangle {
            normal: na::Vector3::zeros(),
            vertices,
        };
        triangle.normal = triangle.face_normal();
        triangle
    }

    /// Normal computed from winding. Zero for degenerate triangles.
    pub fn face_normal(&self) -> na::Vector3<f32> {
        let [a, b, c] = self.vertices;
        (b - a)
            .cross(&(c - a))
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(na::Vector3::zeros)
    }
}

/// Unindexed triangle soup, the way STL stores it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TriMesh {
    pub triangles: Vec<Triangle>,
}

impl TriMesh {
    pub fn new(triangles: Vec<Triangle>) -> Self {
        TriMesh { triangles }
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    pub fn translate(&mut self, offset: &na::Vector3<f32>) {
        for triangle in &mut self.triangles {
            for vertex in &mut triangle.vertices {
                *vertex += *offset;
            }
        }
    }

    pub fn transformed(&self, iso: &na::Isometry3<f32>) -> TriMesh {
        TriMesh {
            triangles: self
                .triangles
                .iter()
                .map(|triangle| Triangle {
                    normal: iso.rotation * triangle.normal,
                    vertices: [
                        iso * triangle.vertices[0],
                        iso * triangle.vertices[1],
                        iso * triangle.vertices[2],
                    ],
                })
                .collect(),
        }
    }

    /// Reads binary or ASCII STL.
    pub fn read_stl(mut reader: impl Read) -> Result<Self, StlError> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        if is_binary_stl(&bytes) {
            return read_binary(&bytes);
        }

        let head = bytes.iter().skip_while(|b| b.is_ascii_whitespace());
        if head.take(5).copied().eq(b"solid".iter().copied()) {
            let text = String::from_utf8_lossy(&bytes);
            return read_ascii(&text);
        }

        read_binary(&bytes)
    }

    /// Writes binary STL.
    pub fn write_stl(&self, mut writer: impl Write) -> Result<(), StlError> {
        let count =
            u32::try_from(self.triangles.len()).map_err(|_| StlError::TooLarge)?;

        let mut header = [0u8; STL_HEADER_LEN];
        let label = b"linkmesh binary STL";
        header[..label.len()].copy_from_slice(label);
        writer.write_all(&header)?;
        writer.write_u32::<LittleEndian>(count)?;

        for triangle in &self.triangles {
            let normal = if triangle.normal == na::Vector3::zeros() {
                triangle.face_normal()
            } else {
                triangle.normal
            };
            write_vec3(&mut writer, &normal)?;
            for vertex in &triangle.vertices {
                write_vec3(&mut writer, &vertex.coords)?;
            }
            writer.write_u16::<LittleEndian>(0)?;
        }

        writer.flush()?;
        Ok(())
    }
}

/// Size of binary STL with `count` triangles, `None` if not addressable.
fn binary_stl_len(count: usize) -> Option<usize> {
    count
        .checked_mul(STL_TRIANGLE_LEN)?
        .checked_add(STL_HEADER_LEN + 4)
}

fn is_binary_stl(bytes: &[u8]) -> bool {
    if bytes.len() < STL_HEADER_LEN + 4 {
        return false;
    }
    let count = (&bytes[STL_HEADER_LEN..])
        .read_u32::<LittleEndian>()
        .unwrap_or(0) as usize;
    binary_stl_len(count) == Some(bytes.len())
}

fn read_binary(bytes: &[u8]) -> Result<TriMesh, StlError> {
    if bytes.len() < STL_HEADER_LEN + 4 {
        return Err(StlError::Truncated {
            expected: STL_HEADER_LEN + 4,
            actual: bytes.len(),
        });
    }

    let mut cursor = &bytes[STL_HEADER_LEN..];
    let count = cursor.read_u32::<LittleEndian>()? as usize;
    let expected = binary_stl_len(count).unwrap_or(usize::MAX);
    if bytes.len() < expected {
        return Err(StlError::Truncated {
            expected,
            actual: bytes.len(),
        });
    }

    let mut triangles = Vec::with_capacity(count);
    for _ in 0..count {
        let normal = read_vec3(&mut cursor)?;
        let a = read_vec3(&mut cursor)?;
        let b = read_vec3(&mut cursor)?;
        let c = read_vec3(&mut cursor)?;
        let _attributes = cursor.read_u16::<LittleEndian>()?;

        let mut triangle = Triangle {
            normal,
            vertices: [a.into(), b.into(), c.into()],
        };
        if triangle.normal == na::Vector3::zeros() {
            triangle.normal = triangle.face_normal();
        }
        triangles.push(triangle);
    }

    tracing::debug!("{} triangles loaded from binary STL", count);
    Ok(TriMesh { triangles })
}

fn read_ascii(text: &str) -> Result<TriMesh, StlError> {
    let mut tokens = text.split_whitespace();
    let mut triangles = Vec::new();

    while let Some(token) = tokens.next() {
        if token != "facet" {
            continue;
        }
        let facet = triangles.len();
        let error = |message| StlError::Ascii { facet, message };

        if tokens.next() != Some("normal") {
            return Err(error("expected 'normal'"));
        }
        let normal = ascii_vec3(&mut tokens).ok_or_else(|| error("bad normal"))?;

        let mut vertices = Vec::with_capacity(3);
        loop {
            match tokens.next() {
                Some("vertex") => {
                    let vertex = ascii_vec3(&mut tokens)
                        .ok_or_else(|| error("bad vertex"))?;
                    vertices.push(na::Point3::from(vertex));
                }
                Some("endfacet") => break,
                Some(_) => {}
                None => return Err(error("unexpected end of file")),
            }
        }

        if vertices.len() != 3 {
            return Err(error("facet must have exactly 3 vertices"));
        }

        let mut triangle = Triangle {
            normal,
            vertices: [vertices[0], vertices[1], vertices[2]],
        };
        if triangle.normal == na::Vector3::zeros() {
            triangle.normal = triangle.face_normal();
        }
        triangles.push(triangle);
    }

    tracing::debug!("{} triangles loaded from ASCII STL", triangles.len());
    Ok(TriMesh { triangles })
}

fn ascii_vec3<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
) -> Option<na::Vector3<f32>> {
    let mut next = || tokens.next()?.parse::<f32>().ok();
    Some(na::Vector3::new(next()?, next()?, next()?))
}

fn read_vec3(reader: &mut impl Read) -> io::Result<na::Vector3<f32>> {
    Ok(na::Vector3::new(
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ))
}

fn write_vec3(writer: &mut impl Write, v: &na::Vector3<f32>) -> io::Result<()> {
    writer.write_f32::<LittleEndian>(v.x)?;
    writer.write_f32::<LittleEndian>(v.y)?;
    writer.write_f32::<LittleEndian>(v.z)?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn unit_triangle() -> TriMesh {
    TriMesh::new(vec![Triangle::new([
        na::Point3::new(0.0, 0.0, 0.0),
        na::Point3::new(1.0, 0.0, 0.0),
        na::Point3::new(0.0, 1.0, 0.0),
    ])])
}
