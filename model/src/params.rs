use crate::ModelError;
use candle_core::{Tensor, Var};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NamedTensor {
    pub name: String,
    pub shape: Vec<usize>,
    pub values: Vec<f32>,
}

/// Plain copy of a set of variables, ordered by name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Params(pub Vec<NamedTensor>);

impl Params {
    pub fn iter(&self) -> impl Iterator<Item = &NamedTensor> {
        self.0.iter()
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn get(&self, name: &str) -> Option<&NamedTensor> {
        self.0.iter().find(|t| t.name == name)
    }
    pub fn value_count(&self) -> usize {
        self.0.iter().map(|t| t.values.len()).sum()
    }
}

/// `vars` must already be sorted by name.
pub(crate) fn snapshot(vars: &[(String, Var)]) -> Result<Params, ModelError> {
    let mut tensors = Vec::with_capacity(vars.len());
    for (name, var) in vars {
        let tensor = var.as_tensor().detach();
        tensors.push(NamedTensor {
            name: name.clone(),
            shape: tensor.dims().to_vec(),
            values: tensor.flatten_all()?.to_vec1::<f32>()?,
        });
    }
    Ok(Params(tensors))
}

/// Writes `params` into `vars`. Nothing is written unless every name and
/// shape matches.
pub(crate) fn restore(vars: &[(String, Var)], params: &Params) -> Result<(), ModelError> {
    if let Some(extra) = params
        .iter()
        .find(|t| !vars.iter().any(|(name, _)| *name == t.name))
    {
        return Err(ModelError::UnexpectedParam(extra.name.clone()));
    }
    let mut updates = Vec::with_capacity(vars.len());
    for (name, var) in vars {
        let saved = params
            .get(name)
            .ok_or_else(|| ModelError::MissingParam(name.clone()))?;
        let expected = var.dims().to_vec();
        if saved.shape != expected || saved.values.len() != var.elem_count() {
            return Err(ModelError::ShapeMismatch {
                name: name.clone(),
                expected,
                actual: saved.shape.clone(),
            });
        }
        let tensor = Tensor::from_slice(&saved.values, saved.shape.as_slice(), var.device())?;
        updates.push((var, tensor));
    }
    for (var, tensor) in updates {
        var.set(&tensor)?;
    }
    Ok(())
}
