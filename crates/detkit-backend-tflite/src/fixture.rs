//! Writes minimal TFLite flatbuffers that carry tensor metadata only.
//!
//! Handy for tests across the workspace: a detector's IO description is enough to drive the
//! inspector without shipping a real model.

use flatbuffers::{FlatBufferBuilder, WIPOffset};

use crate::schema::{self, Model, SubGraph, Tensor};

#[derive(Clone, Debug)]
pub struct TensorDef {
    name: Option<String>,
    shape: Option<Vec<i32>>,
    signature: Option<Vec<i32>>,
    type_code: i8,
}

impl TensorDef {
    /// A FLOAT32 tensor with the given shape.
    pub fn new(name: &str, shape: &[i32]) -> Self {
        Self {
            name: Some(name.to_string()),
            shape: Some(shape.to_vec()),
            signature: None,
            type_code: 0,
        }
    }

    pub fn type_code(mut self, code: i8) -> Self {
        self.type_code = code;
        self
    }

    pub fn signature(mut self, dims: &[i32]) -> Self {
        self.signature = Some(dims.to_vec());
        self
    }

    pub fn unnamed(mut self) -> Self {
        self.name = None;
        self
    }

    pub fn without_shape(mut self) -> Self {
        self.shape = None;
        self
    }
}

#[derive(Clone, Debug, Default)]
pub struct ModelBuilder {
    inputs: Vec<TensorDef>,
    outputs: Vec<TensorDef>,
    dangling_outputs: Vec<i32>,
    description: Option<String>,
    omit_subgraphs: bool,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(mut self, tensor: TensorDef) -> Self {
        self.inputs.push(tensor);
        self
    }

    pub fn output(mut self, tensor: TensorDef) -> Self {
        self.outputs.push(tensor);
        self
    }

    /// Adds an output index that points at no tensor.
    pub fn dangling_output(mut self, index: i32) -> Self {
        self.dangling_outputs.push(index);
        self
    }

    pub fn description(mut self, text: &str) -> Self {
        self.description = Some(text.to_string());
        self
    }

    /// Omits the subgraph table entirely.
    pub fn without_subgraphs(mut self) -> Self {
        self.omit_subgraphs = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut fbb = FlatBufferBuilder::new();

        let tensors: Vec<_> = self
            .inputs
            .iter()
            .chain(self.outputs.iter())
            .map(|def| write_tensor(&mut fbb, def))
            .collect();
        let n_in = self.inputs.len() as i32;
        let n_out = self.outputs.len() as i32;
        let input_ids: Vec<i32> = (0..n_in).collect();
        let output_ids: Vec<i32> = (n_in..n_in + n_out)
            .chain(self.dangling_outputs.iter().copied())
            .collect();

        let subgraphs = if !self.omit_subgraphs {
            let tensors = fbb.create_vector(&tensors);
            let inputs = fbb.create_vector(&input_ids);
            let outputs = fbb.create_vector(&output_ids);
            let name = fbb.create_string("main");
            let start = fbb.start_table();
            fbb.push_slot_always(SubGraph::VT_TENSORS, tensors);
            fbb.push_slot_always(SubGraph::VT_INPUTS, inputs);
            fbb.push_slot_always(SubGraph::VT_OUTPUTS, outputs);
            fbb.push_slot_always(SubGraph::VT_NAME, name);
            let graph = fbb.end_table(start);
            Some(fbb.create_vector(&[graph]))
        } else {
            None
        };
        let description = self.description.as_deref().map(|d| fbb.create_string(d));

        let start = fbb.start_table();
        fbb.push_slot::<u32>(Model::VT_VERSION, 3, 0);
        if let Some(subgraphs) = subgraphs {
            fbb.push_slot_always(Model::VT_SUBGRAPHS, subgraphs);
        }
        if let Some(description) = description {
            fbb.push_slot_always(Model::VT_DESCRIPTION, description);
        }
        let root = fbb.end_table(start);
        fbb.finish(root, Some(schema::FILE_IDENTIFIER));
        fbb.finished_data().to_vec()
    }
}

fn write_tensor(
    fbb: &mut FlatBufferBuilder<'_>,
    def: &TensorDef,
) -> WIPOffset<flatbuffers::TableFinishedWIPOffset> {
    let name = def.name.as_deref().map(|n| fbb.create_string(n));
    let shape = def.shape.as_deref().map(|s| fbb.create_vector(s));
    let signature = def.signature.as_deref().map(|s| fbb.create_vector(s));

    let start = fbb.start_table();
    if let Some(shape) = shape {
        fbb.push_slot_always(Tensor::VT_SHAPE, shape);
    }
    fbb.push_slot::<i8>(Tensor::VT_TYPE, def.type_code, 0);
    if let Some(name) = name {
        fbb.push_slot_always(Tensor::VT_NAME, name);
    }
    if let Some(signature) = signature {
        fbb.push_slot_always(Tensor::VT_SHAPE_SIGNATURE, signature);
    }
    fbb.end_table(start)
}
