//! Read-only accessors for the parts of the TFLite schema (`schema.fbs`, identifier `TFL3`)
//! that describe a model's tensors. Operators, buffers and quantization tables are never
//! touched, so their bytes are not verified or read.

use flatbuffers::{
    Follow, ForwardsUOffset, InvalidFlatbuffer, Table, VOffsetT, Vector, Verifiable, Verifier,
};

pub const FILE_IDENTIFIER: &str = "TFL3";

#[derive(Clone, Copy, Debug)]
pub struct Model<'a> {
    tab: Table<'a>,
}

impl<'a> Follow<'a> for Model<'a> {
    type Inner = Model<'a>;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            tab: Table::new(buf, loc),
        }
    }
}

impl<'a> Model<'a> {
    pub const VT_VERSION: VOffsetT = 4;
    pub const VT_SUBGRAPHS: VOffsetT = 8;
    pub const VT_DESCRIPTION: VOffsetT = 10;

    // SAFETY (all accessors): tables are only reachable through `flatbuffers::root`, which
    // verified every field declared in the `Verifiable` impls below.

    pub fn version(&self) -> u32 {
        unsafe { self.tab.get::<u32>(Self::VT_VERSION, Some(0)) }.unwrap_or(0)
    }

    pub fn subgraphs(&self) -> Option<Vector<'a, ForwardsUOffset<SubGraph<'a>>>> {
        unsafe {
            self.tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<SubGraph<'a>>>>>(
                    Self::VT_SUBGRAPHS,
                    None,
                )
        }
    }

    pub fn description(&self) -> Option<&'a str> {
        unsafe {
            self.tab
                .get::<ForwardsUOffset<&str>>(Self::VT_DESCRIPTION, None)
        }
    }
}

impl Verifiable for Model<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<u32>("version", Self::VT_VERSION, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<SubGraph>>>>(
                "subgraphs",
                Self::VT_SUBGRAPHS,
                false,
            )?
            .visit_field::<ForwardsUOffset<&str>>("description", Self::VT_DESCRIPTION, false)?
            .finish();
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct SubGraph<'a> {
    tab: Table<'a>,
}

impl<'a> Follow<'a> for SubGraph<'a> {
    type Inner = SubGraph<'a>;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            tab: Table::new(buf, loc),
        }
    }
}

impl<'a> SubGraph<'a> {
    pub const VT_TENSORS: VOffsetT = 4;
    pub const VT_INPUTS: VOffsetT = 6;
    pub const VT_OUTPUTS: VOffsetT = 8;
    pub const VT_NAME: VOffsetT = 12;

    pub fn tensors(&self) -> Option<Vector<'a, ForwardsUOffset<Tensor<'a>>>> {
        unsafe {
            self.tab
                .get::<ForwardsUOffset<Vector<'a, ForwardsUOffset<Tensor<'a>>>>>(
                    Self::VT_TENSORS,
                    None,
                )
        }
    }

    pub fn inputs(&self) -> Option<Vector<'a, i32>> {
        unsafe {
            self.tab
                .get::<ForwardsUOffset<Vector<'a, i32>>>(Self::VT_INPUTS, None)
        }
    }

    pub fn outputs(&self) -> Option<Vector<'a, i32>> {
        unsafe {
            self.tab
                .get::<ForwardsUOffset<Vector<'a, i32>>>(Self::VT_OUTPUTS, None)
        }
    }

    pub fn name(&self) -> Option<&'a str> {
        unsafe { self.tab.get::<ForwardsUOffset<&str>>(Self::VT_NAME, None) }
    }
}

impl Verifiable for SubGraph<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, ForwardsUOffset<Tensor>>>>(
                "tensors",
                Self::VT_TENSORS,
                false,
            )?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("inputs", Self::VT_INPUTS, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("outputs", Self::VT_OUTPUTS, false)?
            .visit_field::<ForwardsUOffset<&str>>("name", Self::VT_NAME, false)?
            .finish();
        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct Tensor<'a> {
    tab: Table<'a>,
}

impl<'a> Follow<'a> for Tensor<'a> {
    type Inner = Tensor<'a>;

    #[inline]
    unsafe fn follow(buf: &'a [u8], loc: usize) -> Self::Inner {
        Self {
            tab: Table::new(buf, loc),
        }
    }
}

impl<'a> Tensor<'a> {
    pub const VT_SHAPE: VOffsetT = 4;
    pub const VT_TYPE: VOffsetT = 6;
    pub const VT_NAME: VOffsetT = 10;
    pub const VT_SHAPE_SIGNATURE: VOffsetT = 18;

    pub fn shape(&self) -> Option<Vector<'a, i32>> {
        unsafe {
            self.tab
                .get::<ForwardsUOffset<Vector<'a, i32>>>(Self::VT_SHAPE, None)
        }
    }

    /// Raw `TensorType` code; FLOAT32 (0) when absent.
    pub fn type_code(&self) -> i8 {
        unsafe { self.tab.get::<i8>(Self::VT_TYPE, Some(0)) }.unwrap_or(0)
    }

    pub fn name(&self) -> Option<&'a str> {
        unsafe { self.tab.get::<ForwardsUOffset<&str>>(Self::VT_NAME, None) }
    }

    pub fn shape_signature(&self) -> Option<Vector<'a, i32>> {
        unsafe {
            self.tab
                .get::<ForwardsUOffset<Vector<'a, i32>>>(Self::VT_SHAPE_SIGNATURE, None)
        }
    }
}

impl Verifiable for Tensor<'_> {
    #[inline]
    fn run_verifier(v: &mut Verifier, pos: usize) -> Result<(), InvalidFlatbuffer> {
        v.visit_table(pos)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>("shape", Self::VT_SHAPE, false)?
            .visit_field::<i8>("type", Self::VT_TYPE, false)?
            .visit_field::<ForwardsUOffset<&str>>("name", Self::VT_NAME, false)?
            .visit_field::<ForwardsUOffset<Vector<'_, i32>>>(
                "shape_signature",
                Self::VT_SHAPE_SIGNATURE,
                false,
            )?
            .finish();
        Ok(())
    }
}

/// Verifies `buf` and returns the root `Model` table.
pub fn root_as_model(buf: &[u8]) -> Result<Model<'_>, InvalidFlatbuffer> {
    flatbuffers::root::<Model>(buf)
}
