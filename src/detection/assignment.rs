//! 数据关联: IoU 亲和矩阵 + 分配求解
//! Data association: IoU affinity matrix and assignment solvers
//!
//! - Optimal: Jonker-Volgenant 最小代价二分匹配 (代价 1 - IoU),结果可复现
//! - Greedy:  按 IoU 从高到低贪心,同分时 uid 小者优先,再按检测下标

use anyhow::{anyhow, Result};
use lapjv::{lapjv, Matrix};
use log::warn;
use ndarray::Array2;

use super::tracker::compute_iou;
use super::types::BBox;
use crate::tracker_config::AssignmentMethod;

/// 禁止匹配的代价
const INVALID_MATCH: f64 = 1_000_000.0;

/// 计算 IoU 亲和矩阵, 行 = 轨迹, 列 = 检测
pub fn iou_matrix(tracks: &[BBox], detections: &[BBox]) -> Array2<f32> {
    Array2::from_shape_fn((tracks.len(), detections.len()), |(t, d)| {
        compute_iou(&tracks[t], &detections[d])
    })
}

/// 最优匹配
///
/// 代价矩阵补成方阵,低于阈值的配对给极大代价,求解后再丢弃。
/// 返回 (行, 列) 按行升序。
pub fn optimal_assignment(
    affinity: &Array2<f32>,
    iou_threshold: f32,
) -> Result<Vec<(usize, usize)>> {
    let (rows, cols) = affinity.dim();
    if rows == 0 || cols == 0 {
        return Ok(Vec::new());
    }

    // costs matrix must be square
    let dims = rows.max(cols);
    let costs = Matrix::from_shape_fn((dims, dims), |(r, c)| {
        if r < rows && c < cols {
            let iou = affinity[(r, c)];
            if iou >= iou_threshold {
                1.0 - iou as f64
            } else {
                INVALID_MATCH
            }
        } else {
            0.0
        }
    });

    let (row_to_col, _) = lapjv(&costs).map_err(|e| anyhow!("lapjv failed: {:?}", e))?;

    let assignments = row_to_col
        .iter()
        .enumerate()
        .filter(|&(r, &c)| r < rows && c < cols && affinity[(r, c)] >= iou_threshold)
        .map(|(r, &c)| (r, c))
        .collect();

    Ok(assignments)
}

/// 贪心匹配
///
/// 轨迹行按 uid 升序排列,所以"行号小"即"uid 小"。
/// 返回 (行, 列) 按行升序。
pub fn greedy_assignment(affinity: &Array2<f32>, iou_threshold: f32) -> Vec<(usize, usize)> {
    let (rows, cols) = affinity.dim();

    let mut candidates: Vec<(f32, usize, usize)> = affinity
        .indexed_iter()
        .filter(|(_, iou)| **iou >= iou_threshold)
        .map(|((r, c), &iou)| (iou, r, c))
        .collect();

    // IoU 降序, 然后行升序, 然后列升序
    candidates.sort_by(|a, b| {
        b.0.total_cmp(&a.0)
            .then_with(|| a.1.cmp(&b.1))
            .then_with(|| a.2.cmp(&b.2))
    });

    let mut used_row = vec![false; rows];
    let mut used_col = vec![false; cols];
    let mut assignments = Vec::new();

    for (_, r, c) in candidates {
        if !used_row[r] && !used_col[c] {
            assignments.push((r, c));
            used_row[r] = true;
            used_col[c] = true;
        }
    }

    assignments.sort_unstable();
    assignments
}

/// 按配置的方法匹配,最优求解失败时退回贪心
pub fn assign(
    affinity: &Array2<f32>,
    iou_threshold: f32,
    method: AssignmentMethod,
) -> Vec<(usize, usize)> {
    assign_with(affinity, iou_threshold, method, optimal_assignment)
}

fn assign_with<F>(
    affinity: &Array2<f32>,
    iou_threshold: f32,
    method: AssignmentMethod,
    solver: F,
) -> Vec<(usize, usize)>
where
    F: FnOnce(&Array2<f32>, f32) -> Result<Vec<(usize, usize)>>,
{
    match method {
        AssignmentMethod::Optimal => match solver(affinity, iou_threshold) {
            Ok(assignments) => assignments,
            Err(e) => {
                warn!("{}, falling back to greedy assignment", e);
                greedy_assignment(affinity, iou_threshold)
            }
        },
        AssignmentMethod::Greedy => greedy_assignment(affinity, iou_threshold),
    }
}
