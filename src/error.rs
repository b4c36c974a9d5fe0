// Copyright 2024 Isera Developers

// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at

//     http://www.apache.org/licenses/LICENSE-2.0

// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

/// Reasons a solve can fail. None of them leave a partial result behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SolverError {
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("no optimal basis reached after {pivots} pivots")]
    NonConvergence { pivots: usize },
}

pub type Result<T> = std::result::Result<T, SolverError>;
