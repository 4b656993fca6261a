//! netCDF classic (CDF-1) encoding of fixed-size arrays
//!
//! Only the subset needed for cruise members: named dimensions, global and
//! per-variable attributes, and non-record variables. Files written here use
//! version 1 with 32-bit offsets; version 2 (64-bit offsets) is readable.

use crate::{Error, Result};
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Cursor, Read};

const MAGIC: &[u8; 3] = b"CDF";
const VERSION_CLASSIC: u8 = 1;
const VERSION_64BIT: u8 = 2;

const NC_DIMENSION: u32 = 0x0A;
const NC_VARIABLE: u32 = 0x0B;
const NC_ATTRIBUTE: u32 = 0x0C;

const NC_BYTE: u32 = 1;
const NC_CHAR: u32 = 2;
const NC_SHORT: u32 = 3;
const NC_INT: u32 = 4;
const NC_FLOAT: u32 = 5;
const NC_DOUBLE: u32 = 6;

#[derive(Debug, Clone, PartialEq)]
pub struct NcDimension {
    pub name: String,
    pub len: usize,
}

/// Typed array payload of an attribute or variable
#[derive(Debug, Clone, PartialEq)]
pub enum NcValues {
    Byte(Vec<i8>),
    Char(Vec<u8>),
    Short(Vec<i16>),
    Int(Vec<i32>),
    Float(Vec<f32>),
    Double(Vec<f64>),
}

impl NcValues {
    /// Text attribute
    pub fn text(s: &str) -> Self {
        NcValues::Char(s.as_bytes().to_vec())
    }

    pub fn len(&self) -> usize {
        match self {
            NcValues::Byte(v) => v.len(),
            NcValues::Char(v) => v.len(),
            NcValues::Short(v) => v.len(),
            NcValues::Int(v) => v.len(),
            NcValues::Float(v) => v.len(),
            NcValues::Double(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Character payload as text, NUL padding removed
    pub fn as_text(&self) -> Option<String> {
        match self {
            NcValues::Char(bytes) => {
                let end = bytes.iter().position(|b| *b == 0).unwrap_or(bytes.len());
                Some(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
            _ => None,
        }
    }

    /// Numeric payload widened to f64
    pub fn as_f64s(&self) -> Option<Vec<f64>> {
        match self {
            NcValues::Byte(v) => Some(v.iter().map(|x| f64::from(*x)).collect()),
            NcValues::Short(v) => Some(v.iter().map(|x| f64::from(*x)).collect()),
            NcValues::Int(v) => Some(v.iter().map(|x| f64::from(*x)).collect()),
            NcValues::Float(v) => Some(v.iter().map(|x| f64::from(*x)).collect()),
            NcValues::Double(v) => Some(v.clone()),
            NcValues::Char(_) => None,
        }
    }

    fn type_code(&self) -> u32 {
        match self {
            NcValues::Byte(_) => NC_BYTE,
            NcValues::Char(_) => NC_CHAR,
            NcValues::Short(_) => NC_SHORT,
            NcValues::Int(_) => NC_INT,
            NcValues::Float(_) => NC_FLOAT,
            NcValues::Double(_) => NC_DOUBLE,
        }
    }

    fn byte_len(&self) -> usize {
        self.len() * element_size(self.type_code())
    }

    fn write_to(&self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            NcValues::Byte(v) => {
                for x in v {
                    out.write_i8(*x)?;
                }
            }
            NcValues::Char(v) => out.extend_from_slice(v),
            NcValues::Short(v) => {
                for x in v {
                    out.write_i16::<BigEndian>(*x)?;
                }
            }
            NcValues::Int(v) => {
                for x in v {
                    out.write_i32::<BigEndian>(*x)?;
                }
            }
            NcValues::Float(v) => {
                for x in v {
                    out.write_f32::<BigEndian>(*x)?;
                }
            }
            NcValues::Double(v) => {
                for x in v {
                    out.write_f64::<BigEndian>(*x)?;
                }
            }
        }
        pad_to_four(out);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NcAttribute {
    pub name: String,
    pub value: NcValues,
}

impl NcAttribute {
    pub fn new(name: impl Into<String>, value: NcValues) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NcVariable {
    pub name: String,
    /// Indices into [`NcFile::dimensions`]
    pub dimensions: Vec<usize>,
    pub attributes: Vec<NcAttribute>,
    pub data: NcValues,
}

impl NcVariable {
    pub fn attribute(&self, name: &str) -> Option<&NcValues> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }
}

/// In-memory classic netCDF dataset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NcFile {
    pub dimensions: Vec<NcDimension>,
    pub attributes: Vec<NcAttribute>,
    pub variables: Vec<NcVariable>,
}

impl NcFile {
    /// Add a dimension, returning its index
    pub fn add_dimension(&mut self, name: impl Into<String>, len: usize) -> usize {
        self.dimensions.push(NcDimension {
            name: name.into(),
            len,
        });
        self.dimensions.len() - 1
    }

    pub fn attribute(&self, name: &str) -> Option<&NcValues> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    pub fn variable(&self, name: &str) -> Option<&NcVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Product of the variable's dimension lengths
    fn element_count(&self, variable: &NcVariable) -> Result<usize> {
        variable.dimensions.iter().try_fold(1usize, |acc, index| {
            let dimension = self.dimensions.get(*index).ok_or_else(|| {
                Error::malformed_header(format!(
                    "variable {} refers to unknown dimension {}",
                    variable.name, index
                ))
            })?;
            acc.checked_mul(dimension.len).ok_or_else(|| {
                Error::malformed_header(format!("variable {} is too large", variable.name))
            })
        })
    }

    /// Serialize as a CDF-1 byte stream
    pub fn encode(&self) -> Result<Vec<u8>> {
        for variable in &self.variables {
            let expected = self.element_count(variable)?;
            if expected != variable.data.len() {
                return Err(Error::malformed_data(
                    0,
                    format!(
                        "variable {} holds {} values for {} cells",
                        variable.name,
                        variable.data.len(),
                        expected
                    ),
                ));
            }
        }

        // The header has a fixed size for given contents, so lay it out once
        // with placeholder offsets to learn where the data starts.
        let placeholder = vec![0u32; self.variables.len()];
        let header_len = self.encode_header(&placeholder)?.len();
        let mut begins = Vec::with_capacity(self.variables.len());
        let mut offset = header_len;
        for variable in &self.variables {
            begins.push(u32::try_from(offset).map_err(|_| {
                Error::not_supported("netCDF classic file larger than 4 GiB")
            })?);
            offset += padded(variable.data.byte_len());
        }

        let mut out = self.encode_header(&begins)?;
        for variable in &self.variables {
            variable.data.write_to(&mut out)?;
        }
        Ok(out)
    }

    fn encode_header(&self, begins: &[u32]) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.write_u8(VERSION_CLASSIC)?;
        out.write_u32::<BigEndian>(0)?;

        if self.dimensions.is_empty() {
            write_absent(&mut out)?;
        } else {
            out.write_u32::<BigEndian>(NC_DIMENSION)?;
            out.write_u32::<BigEndian>(count(self.dimensions.len())?)?;
            for dimension in &self.dimensions {
                if dimension.len == 0 {
                    return Err(Error::not_supported(format!(
                        "record dimension {}",
                        dimension.name
                    )));
                }
                write_name(&mut out, &dimension.name)?;
                out.write_u32::<BigEndian>(count(dimension.len)?)?;
            }
        }

        write_attributes(&mut out, &self.attributes)?;

        if self.variables.is_empty() {
            write_absent(&mut out)?;
        } else {
            out.write_u32::<BigEndian>(NC_VARIABLE)?;
            out.write_u32::<BigEndian>(count(self.variables.len())?)?;
            for (variable, begin) in self.variables.iter().zip(begins) {
                write_name(&mut out, &variable.name)?;
                out.write_u32::<BigEndian>(count(variable.dimensions.len())?)?;
                for index in &variable.dimensions {
                    out.write_u32::<BigEndian>(count(*index)?)?;
                }
                write_attributes(&mut out, &variable.attributes)?;
                out.write_u32::<BigEndian>(variable.data.type_code())?;
                out.write_u32::<BigEndian>(count(padded(variable.data.byte_len()))?)?;
                out.write_u32::<BigEndian>(*begin)?;
            }
        }
        Ok(out)
    }

    /// Parse a CDF-1 or CDF-2 byte stream
    pub fn decode(bytes: &[u8]) -> Result<NcFile> {
        let mut reader = Cursor::new(bytes);

        let mut magic = [0u8; 3];
        reader.read_exact(&mut magic).map_err(truncated)?;
        if &magic != MAGIC {
            return Err(Error::malformed_header("not a netCDF classic file"));
        }
        let version = reader.read_u8().map_err(truncated)?;
        if version != VERSION_CLASSIC && version != VERSION_64BIT {
            return Err(Error::not_supported(format!("netCDF format version {}", version)));
        }
        let _numrecs = reader.read_u32::<BigEndian>().map_err(truncated)?;

        let mut file = NcFile::default();

        let (tag, n) = read_list_header(&mut reader)?;
        if n > 0 {
            expect_tag(tag, NC_DIMENSION, "dimension")?;
            for _ in 0..n {
                let name = read_name(&mut reader)?;
                let len = reader.read_u32::<BigEndian>().map_err(truncated)? as usize;
                if len == 0 {
                    return Err(Error::not_supported(format!("record dimension {}", name)));
                }
                file.dimensions.push(NcDimension { name, len });
            }
        }

        file.attributes = read_attributes(&mut reader)?;

        let mut layout = Vec::new();
        let (tag, n) = read_list_header(&mut reader)?;
        if n > 0 {
            expect_tag(tag, NC_VARIABLE, "variable")?;
            for _ in 0..n {
                let name = read_name(&mut reader)?;
                let rank = reader.read_u32::<BigEndian>().map_err(truncated)? as usize;
                let mut dimensions = Vec::with_capacity(rank.min(8));
                for _ in 0..rank {
                    dimensions.push(reader.read_u32::<BigEndian>().map_err(truncated)? as usize);
                }
                let attributes = read_attributes(&mut reader)?;
                let type_code = reader.read_u32::<BigEndian>().map_err(truncated)?;
                let _vsize = reader.read_u32::<BigEndian>().map_err(truncated)?;
                let begin = if version == VERSION_64BIT {
                    reader.read_u64::<BigEndian>().map_err(truncated)?
                } else {
                    u64::from(reader.read_u32::<BigEndian>().map_err(truncated)?)
                };
                let variable = NcVariable {
                    name,
                    dimensions,
                    attributes,
                    data: NcValues::Byte(Vec::new()),
                };
                layout.push((type_code, begin));
                file.variables.push(variable);
            }
        }

        for index in 0..file.variables.len() {
            let (type_code, begin) = layout[index];
            let cells = file.element_count(&file.variables[index])?;
            let start = usize::try_from(begin)
                .map_err(|_| Error::malformed_header("variable offset out of range"))?;
            let end = start
                .checked_add(cells.saturating_mul(element_size_checked(type_code)?))
                .filter(|end| *end <= bytes.len())
                .ok_or_else(|| {
                    Error::malformed_header(format!(
                        "variable {} runs past the end of the file",
                        file.variables[index].name
                    ))
                })?;
            let mut data = Cursor::new(&bytes[start..end]);
            file.variables[index].data = read_values(&mut data, type_code, cells)?;
        }

        Ok(file)
    }
}

fn truncated(e: std::io::Error) -> Error {
    Error::malformed_header(format!("truncated netCDF header: {}", e))
}

fn element_size(type_code: u32) -> usize {
    match type_code {
        NC_BYTE | NC_CHAR => 1,
        NC_SHORT => 2,
        NC_INT | NC_FLOAT => 4,
        _ => 8,
    }
}

fn element_size_checked(type_code: u32) -> Result<usize> {
    match type_code {
        NC_BYTE..=NC_DOUBLE => Ok(element_size(type_code)),
        other => Err(Error::not_supported(format!("netCDF type code {}", other))),
    }
}

fn padded(len: usize) -> usize {
    len.div_ceil(4) * 4
}

fn pad_to_four(out: &mut Vec<u8>) {
    while out.len() % 4 != 0 {
        out.push(0);
    }
}

fn count(n: usize) -> Result<u32> {
    u32::try_from(n).map_err(|_| Error::not_supported(format!("netCDF count {} too large", n)))
}

fn write_absent(out: &mut Vec<u8>) -> Result<()> {
    out.write_u32::<BigEndian>(0)?;
    out.write_u32::<BigEndian>(0)?;
    Ok(())
}

fn write_name(out: &mut Vec<u8>, name: &str) -> Result<()> {
    out.write_u32::<BigEndian>(count(name.len())?)?;
    out.extend_from_slice(name.as_bytes());
    pad_to_four(out);
    Ok(())
}

fn write_attributes(out: &mut Vec<u8>, attributes: &[NcAttribute]) -> Result<()> {
    if attributes.is_empty() {
        return write_absent(out);
    }
    out.write_u32::<BigEndian>(NC_ATTRIBUTE)?;
    out.write_u32::<BigEndian>(count(attributes.len())?)?;
    for attribute in attributes {
        write_name(out, &attribute.name)?;
        out.write_u32::<BigEndian>(attribute.value.type_code())?;
        out.write_u32::<BigEndian>(count(attribute.value.len())?)?;
        attribute.value.write_to(out)?;
    }
    Ok(())
}

fn read_list_header(reader: &mut Cursor<&[u8]>) -> Result<(u32, usize)> {
    let tag = reader.read_u32::<BigEndian>().map_err(truncated)?;
    let n = reader.read_u32::<BigEndian>().map_err(truncated)? as usize;
    Ok((tag, n))
}

fn expect_tag(found: u32, expected: u32, what: &str) -> Result<()> {
    if found != expected {
        return Err(Error::malformed_header(format!(
            "expected {} list tag {:#x}, found {:#x}",
            what, expected, found
        )));
    }
    Ok(())
}

fn skip_padding(reader: &mut Cursor<&[u8]>, len: usize) -> Result<()> {
    let pad = padded(len) - len;
    let mut scratch = [0u8; 3];
    reader.read_exact(&mut scratch[..pad]).map_err(truncated)
}

fn read_name(reader: &mut Cursor<&[u8]>) -> Result<String> {
    let len = reader.read_u32::<BigEndian>().map_err(truncated)? as usize;
    let remaining = reader.get_ref().len() - reader.position() as usize;
    if len > remaining {
        return Err(Error::malformed_header("name runs past the end of the file"));
    }
    let mut bytes = vec![0u8; len];
    reader.read_exact(&mut bytes).map_err(truncated)?;
    skip_padding(reader, len)?;
    String::from_utf8(bytes).map_err(|_| Error::malformed_header("name is not UTF-8"))
}

fn read_attributes(reader: &mut Cursor<&[u8]>) -> Result<Vec<NcAttribute>> {
    let (tag, n) = read_list_header(reader)?;
    if n == 0 {
        return Ok(Vec::new());
    }
    expect_tag(tag, NC_ATTRIBUTE, "attribute")?;
    let mut attributes = Vec::new();
    for _ in 0..n {
        let name = read_name(reader)?;
        let type_code = reader.read_u32::<BigEndian>().map_err(truncated)?;
        let len = reader.read_u32::<BigEndian>().map_err(truncated)? as usize;
        let value = read_values(reader, type_code, len)?;
        skip_padding(reader, value.byte_len())?;
        attributes.push(NcAttribute { name, value });
    }
    Ok(attributes)
}

fn read_values(reader: &mut Cursor<&[u8]>, type_code: u32, n: usize) -> Result<NcValues> {
    let size = element_size_checked(type_code)?;
    let remaining = reader.get_ref().len() - reader.position() as usize;
    if n.saturating_mul(size) > remaining {
        return Err(Error::malformed_header("values run past the end of the file"));
    }

    Ok(match type_code {
        NC_BYTE => NcValues::Byte(
            (0..n)
                .map(|_| reader.read_i8())
                .collect::<std::io::Result<_>>()
                .map_err(truncated)?,
        ),
        NC_CHAR => {
            let mut bytes = vec![0u8; n];
            reader.read_exact(&mut bytes).map_err(truncated)?;
            NcValues::Char(bytes)
        }
        NC_SHORT => NcValues::Short(
            (0..n)
                .map(|_| reader.read_i16::<BigEndian>())
                .collect::<std::io::Result<_>>()
                .map_err(truncated)?,
        ),
        NC_INT => NcValues::Int(
            (0..n)
                .map(|_| reader.read_i32::<BigEndian>())
                .collect::<std::io::Result<_>>()
                .map_err(truncated)?,
        ),
        NC_FLOAT => NcValues::Float(
            (0..n)
                .map(|_| reader.read_f32::<BigEndian>())
                .collect::<std::io::Result<_>>()
                .map_err(truncated)?,
        ),
        _ => NcValues::Double(
            (0..n)
                .map(|_| reader.read_f64::<BigEndian>())
                .collect::<std::io::Result<_>>()
                .map_err(truncated)?,
        ),
    })
}
