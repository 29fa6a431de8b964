//! Named collections of simulated spectra

// nscatter modules
use nscatter_histogram::Histogram;

// external crates
use serde::{Deserialize, Serialize};

/// One named output, a histogram for every input detector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    /// Name used to retrieve the workspace from a [ResultGroup]
    pub name: String,
    /// One histogram per detector, in input order
    pub spectra: Vec<Histogram>,
}

impl Workspace {
    /// Number of spectra
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    /// True if there are no spectra
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }
}

/// All outputs of a simulation, addressable by name
///
/// For a prefix `P` and `K` scatter orders the group holds:
///
/// - `P_Scatter_1_NoAbs`, single scattering with absorption ignored
/// - `P_Scatter_n` for every order n from 1 to K
/// - `P_Scatter_2_K_Summed`, the sum of orders 2 to K when K is at least 2
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultGroup {
    prefix: String,
    workspaces: Vec<Workspace>,
}

impl ResultGroup {
    /// Assemble the group from per-order spectra
    ///
    /// `orders[n - 1]` holds the spectra for scatter order `n`. Summing
    /// orders 2 and above assumes every order shares the same axes.
    pub(crate) fn assemble(
        prefix: &str,
        no_absorption: Vec<Histogram>,
        orders: Vec<Vec<Histogram>>,
    ) -> nscatter_histogram::Result<Self> {
        let n_scatters = orders.len();
        let mut workspaces = vec![Workspace {
            name: no_absorption_name(prefix),
            spectra: no_absorption,
        }];

        let summed = if n_scatters >= 2 {
            let mut summed = orders[1].clone();
            for order in &orders[2..] {
                for (total, spectrum) in summed.iter_mut().zip(order) {
                    total.add_assign_quadrature(spectrum)?;
                }
            }
            Some(summed)
        } else {
            None
        };

        for (i, spectra) in orders.into_iter().enumerate() {
            workspaces.push(Workspace {
                name: order_name(prefix, i + 1),
                spectra,
            });
        }

        if let Some(spectra) = summed {
            workspaces.push(Workspace {
                name: summed_name(prefix, n_scatters),
                spectra,
            });
        }

        Ok(Self {
            prefix: prefix.to_string(),
            workspaces,
        })
    }

    /// Workspace by full name
    pub fn get(&self, name: &str) -> Option<&Workspace> {
        self.workspaces.iter().find(|w| w.name == name)
    }

    /// Workspace for a scatter order
    pub fn scatter_order(&self, order: usize) -> Option<&Workspace> {
        self.get(&order_name(&self.prefix, order))
    }

    /// Single scattering with absorption ignored
    pub fn no_absorption(&self) -> Option<&Workspace> {
        self.get(&no_absorption_name(&self.prefix))
    }

    /// Sum of every multiple scattering order, if there is more than one order
    pub fn summed(&self) -> Option<&Workspace> {
        self.workspaces
            .last()
            .filter(|w| w.name.ends_with("_Summed"))
    }

    /// Names of every workspace in the group
    pub fn names(&self) -> Vec<&str> {
        self.workspaces.iter().map(|w| w.name.as_str()).collect()
    }

    /// Iterate over the workspaces
    pub fn iter(&self) -> std::slice::Iter<'_, Workspace> {
        self.workspaces.iter()
    }

    /// Number of workspaces
    pub fn len(&self) -> usize {
        self.workspaces.len()
    }

    /// True for a group without workspaces, never the case once assembled
    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty()
    }
}

fn no_absorption_name(prefix: &str) -> String {
    nscatter_utils::f!("{prefix}_Scatter_1_NoAbs")
}

fn order_name(prefix: &str, order: usize) -> String {
    nscatter_utils::f!("{prefix}_Scatter_{order}")
}

fn summed_name(prefix: &str, n_scatters: usize) -> String {
    nscatter_utils::f!("{prefix}_Scatter_2_{n_scatters}_Summed")
}
