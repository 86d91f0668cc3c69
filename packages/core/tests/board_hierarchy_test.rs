//! Integration tests for the board hierarchy engine
//!
//! Tests cover:
//! - Path and depth consistency after create, update and move
//! - Depth policy and hard cap boundaries
//! - Cycle and self-move rejection
//! - Subtree listing, stats and ancestors
//! - Cascading subtree deletion

use anyhow::Result;
use boardspace_core::{
    db::{DatabaseService, PathMaterializer},
    models::{Board, BoardId, BoardUpdate, CreateBoardParams},
    operations::BoardOperations,
    services::{BoardServiceError, HARD_MAX_DEPTH, POLICY_MAX_DEPTH},
};
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tokio_test::{assert_err, assert_ok};

/// Test helper: Create a test environment
async fn create_test_env() -> Result<(BoardOperations, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db = Arc::new(DatabaseService::new(db_path).await?);
    Ok((BoardOperations::new(db), temp_dir))
}

async fn create_root(ops: &BoardOperations, title: &str) -> Result<Board> {
    Ok(ops.create_board(CreateBoardParams::root(title)).await?)
}

async fn create_child(ops: &BoardOperations, parent: &Board, title: &str) -> Result<Board> {
    Ok(ops
        .create_board(CreateBoardParams::child(parent.id, title))
        .await?)
}

/// Build a chain of `levels` boards (the first one a root) through the
/// structural mutator, bypassing the depth policy
async fn create_chain_unchecked(ops: &BoardOperations, levels: u32) -> Result<Vec<Board>> {
    let mut chain: Vec<Board> = Vec::new();
    for level in 0..levels {
        let params = match chain.last() {
            Some(parent) => CreateBoardParams::child(parent.id, format!("Level{}", level)),
            None => CreateBoardParams::root(format!("Level{}", level)),
        };
        chain.push(ops.boards().create(params).await?);
    }
    Ok(chain)
}

/// Assert path, parent and depth consistency for every stored board
async fn assert_tree_consistent(ops: &BoardOperations) -> Result<()> {
    let boards = ops.list_boards().await?;
    let by_id: HashMap<BoardId, &Board> = boards.iter().map(|b| (b.id, b)).collect();

    for board in &boards {
        let own_label = PathMaterializer::label_for(&board.id);
        match board.parent_id {
            Some(parent_id) => {
                let parent = by_id
                    .get(&parent_id)
                    .unwrap_or_else(|| panic!("board {} has a dangling parent", board.id));
                assert_eq!(board.path, parent.path.child(own_label));
            }
            None => assert_eq!(board.path.labels(), &[own_label]),
        }

        let walked = ops.queries().get_depth_by_walk(&board.id).await?;
        assert_eq!(walked, board.path.len() as u32 - 1);
        assert_eq!(walked, ops.get_depth(&board.id).await?);
    }
    Ok(())
}

// =========================================================================
// Creation and Depth
// =========================================================================

#[tokio::test]
async fn test_root_board_has_depth_zero() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let root = create_root(&ops, "Root").await?;
    assert!(root.is_root());
    assert_eq!(ops.get_depth(&root.id).await?, 0);
    assert_eq!(ops.queries().get_depth_by_walk(&root.id).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_create_stores_attributes() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let board = ops
        .create_board(
            CreateBoardParams::root("Roadmap")
                .with_description("Quarterly plans")
                .with_created_by("user-42"),
        )
        .await?;

    let fetched = ops.get_board(&board.id).await?.expect("board should exist");
    assert_eq!(fetched.title, "Roadmap");
    assert_eq!(fetched.description.as_deref(), Some("Quarterly plans"));
    assert_eq!(fetched.created_by.as_deref(), Some("user-42"));
    assert_eq!(fetched.created_at, fetched.updated_at);

    Ok(())
}

#[tokio::test]
async fn test_create_rejects_invalid_title() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let err = assert_err!(ops.create_board(CreateBoardParams::root("   ")).await);
    assert!(matches!(err, BoardServiceError::ValidationFailed(_)));

    let err = assert_err!(
        ops.create_board(CreateBoardParams::root("x".repeat(101)))
            .await
    );
    assert!(matches!(err, BoardServiceError::ValidationFailed(_)));

    assert!(ops.list_boards().await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_create_under_missing_parent() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let err = assert_err!(
        ops.create_board(CreateBoardParams::child(BoardId::new(), "Orphan"))
            .await
    );
    assert!(matches!(err, BoardServiceError::ParentNotFound { .. }));

    Ok(())
}

#[tokio::test]
async fn test_policy_allows_level_ten_and_rejects_level_eleven() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    // Level0..Level9: depth 9
    let mut parent = create_root(&ops, "Level0").await?;
    for level in 1..=9 {
        parent = create_child(&ops, &parent, &format!("Level{}", level)).await?;
    }
    assert_eq!(parent.depth(), 9);

    let level10 = assert_ok!(
        ops.create_board(CreateBoardParams::child(parent.id, "Level10"))
            .await
    );
    assert_eq!(level10.depth(), POLICY_MAX_DEPTH);

    let err = assert_err!(
        ops.create_board(CreateBoardParams::child(level10.id, "Level11"))
            .await
    );
    assert!(matches!(
        err,
        BoardServiceError::MaxHierarchyDepthExceeded { .. }
    ));
    assert!(err.to_string().contains("Maximum hierarchy depth"));

    assert_tree_consistent(&ops).await?;
    Ok(())
}

#[tokio::test]
async fn test_hard_cap_enforced_without_policy() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let chain = create_chain_unchecked(&ops, HARD_MAX_DEPTH + 1).await?;
    let deepest = chain.last().expect("chain is not empty");
    assert_eq!(deepest.depth(), HARD_MAX_DEPTH);

    let err = assert_err!(
        ops.boards()
            .create(CreateBoardParams::child(deepest.id, "Too deep"))
            .await
    );
    assert!(matches!(
        err,
        BoardServiceError::DepthExceeded { depth: 31, max: 30 }
    ));

    assert_tree_consistent(&ops).await?;
    Ok(())
}

#[tokio::test]
async fn test_hard_cap_enforced_on_move_without_policy() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let chain = create_chain_unchecked(&ops, HARD_MAX_DEPTH).await?;
    assert_eq!(chain[29].depth(), 29);

    let root = create_root(&ops, "Loose").await?;
    let _leaf = create_child(&ops, &root, "Loose leaf").await?;

    // Moving a two-level subtree under depth 29 would put the leaf at 31
    let err = assert_err!(ops.boards().move_board(&root.id, Some(&chain[29].id)).await);
    assert!(matches!(err, BoardServiceError::DepthExceeded { .. }));

    // A single board fits exactly at depth 30
    let single = create_root(&ops, "Single").await?;
    let moved = assert_ok!(ops.boards().move_board(&single.id, Some(&chain[29].id)).await);
    assert_eq!(moved.depth(), HARD_MAX_DEPTH);

    assert_tree_consistent(&ops).await?;
    Ok(())
}

// =========================================================================
// Moves
// =========================================================================

#[tokio::test]
async fn test_move_rewrites_subtree_paths() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let a = create_root(&ops, "A").await?;
    let b = create_child(&ops, &a, "B").await?;
    let c = create_child(&ops, &b, "C").await?;
    let target = create_root(&ops, "Target").await?;
    let target_child = create_child(&ops, &target, "Target child").await?;

    let moved = ops
        .update_board(&b.id, BoardUpdate::new().with_parent(Some(target_child.id)))
        .await?
        .expect("moved board");
    assert_eq!(moved.parent_id, Some(target_child.id));
    assert_eq!(moved.depth(), 2);

    let c_after = ops.get_board(&c.id).await?.expect("descendant survives move");
    assert_eq!(c_after.depth(), 3);
    assert!(target.path.is_strict_prefix_of(&c_after.path));
    assert!(c_after.updated_at > c.updated_at);

    assert_eq!(ops.get_stats(&a.id).await?.total_descendants, 0);
    assert_eq!(ops.get_stats(&target.id).await?.total_descendants, 3);

    assert_tree_consistent(&ops).await?;
    Ok(())
}

#[tokio::test]
async fn test_move_with_null_parent_moves_to_root() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let a = create_root(&ops, "A").await?;
    let b = create_child(&ops, &a, "B").await?;
    let c = create_child(&ops, &b, "C").await?;

    let moved = ops
        .update_board(&b.id, BoardUpdate::new().with_parent(None))
        .await?
        .expect("moved board");
    assert!(moved.is_root());

    let roots: Vec<BoardId> = ops.list_roots().await?.iter().map(|r| r.id).collect();
    assert!(roots.contains(&b.id));
    assert_eq!(ops.get_depth(&c.id).await?, 1);

    assert_tree_consistent(&ops).await?;
    Ok(())
}

#[tokio::test]
async fn test_move_into_own_subtree_is_a_cycle() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let a = create_root(&ops, "A").await?;
    let b = create_child(&ops, &a, "B").await?;
    let c = create_child(&ops, &b, "C").await?;

    for descendant in [&b, &c] {
        let err = assert_err!(
            ops.update_board(&a.id, BoardUpdate::new().with_parent(Some(descendant.id)))
                .await
        );
        assert!(matches!(err, BoardServiceError::CycleDetected { .. }));
    }

    let err = assert_err!(ops.boards().move_board(&b.id, Some(&c.id)).await);
    assert!(matches!(err, BoardServiceError::CycleDetected { .. }));

    // Nothing changed
    assert_eq!(ops.get_depth(&c.id).await?, 2);
    assert_tree_consistent(&ops).await?;
    Ok(())
}

#[tokio::test]
async fn test_move_into_itself_is_rejected() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let a = create_root(&ops, "A").await?;

    let err = assert_err!(
        ops.update_board(&a.id, BoardUpdate::new().with_parent(Some(a.id)))
            .await
    );
    assert!(matches!(err, BoardServiceError::SelfMove { .. }));

    let err = assert_err!(ops.boards().move_board(&a.id, Some(&a.id)).await);
    assert!(matches!(err, BoardServiceError::SelfMove { .. }));

    Ok(())
}

#[tokio::test]
async fn test_move_missing_board_or_parent() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let a = create_root(&ops, "A").await?;

    let err = assert_err!(ops.boards().move_board(&BoardId::new(), Some(&a.id)).await);
    assert!(matches!(err, BoardServiceError::NotFound { .. }));

    let err = assert_err!(ops.boards().move_board(&a.id, Some(&BoardId::new())).await);
    assert!(matches!(err, BoardServiceError::NotFound { .. }));

    Ok(())
}

#[tokio::test]
async fn test_move_policy_counts_subtree_height() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    // Target at depth 7
    let mut target = create_root(&ops, "T0").await?;
    for level in 1..=7 {
        target = create_child(&ops, &target, &format!("T{}", level)).await?;
    }

    // Subtree of height 2
    let s = create_root(&ops, "S").await?;
    let s1 = create_child(&ops, &s, "S1").await?;
    let _s2 = create_child(&ops, &s1, "S2").await?;

    // 8 + 2 = 10 is allowed
    assert_ok!(
        ops.update_board(&s.id, BoardUpdate::new().with_parent(Some(target.id)))
            .await
    );

    // Re-parent one level deeper: 9 + 2 = 11
    let deeper = create_child(&ops, &target, "Deeper").await?;
    let err = assert_err!(
        ops.update_board(&s.id, BoardUpdate::new().with_parent(Some(deeper.id)))
            .await
    );
    assert!(matches!(
        err,
        BoardServiceError::MaxHierarchyDepthExceeded { depth: 11, max: 10 }
    ));

    assert_tree_consistent(&ops).await?;
    Ok(())
}

// =========================================================================
// Updates
// =========================================================================

#[tokio::test]
async fn test_update_title_and_description() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let board = ops
        .create_board(CreateBoardParams::root("Draft").with_description("Old"))
        .await?;

    let updated = ops
        .update_board(
            &board.id,
            BoardUpdate::new()
                .with_title("Final")
                .with_description(None),
        )
        .await?
        .expect("board exists");
    assert_eq!(updated.title, "Final");
    assert_eq!(updated.description, None);
    assert_eq!(updated.path, board.path);
    assert!(updated.updated_at > board.updated_at);

    Ok(())
}

#[tokio::test]
async fn test_update_with_move_and_title() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let a = create_root(&ops, "A").await?;
    let b = create_root(&ops, "B").await?;

    let updated = ops
        .update_board(
            &b.id,
            BoardUpdate::new()
                .with_parent(Some(a.id))
                .with_title("B under A"),
        )
        .await?
        .expect("board exists");
    assert_eq!(updated.parent_id, Some(a.id));
    assert_eq!(updated.title, "B under A");

    assert_tree_consistent(&ops).await?;
    Ok(())
}

#[tokio::test]
async fn test_update_invalid_title_does_not_move() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let a = create_root(&ops, "A").await?;
    let b = create_root(&ops, "B").await?;

    let err = assert_err!(
        ops.update_board(
            &b.id,
            BoardUpdate::new().with_parent(Some(a.id)).with_title("")
        )
        .await
    );
    assert!(matches!(err, BoardServiceError::ValidationFailed(_)));

    let b_after = ops.get_board(&b.id).await?.expect("board exists");
    assert!(b_after.is_root());

    Ok(())
}

#[tokio::test]
async fn test_update_missing_board() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let result = ops
        .update_board(&BoardId::new(), BoardUpdate::new().with_title("Ghost"))
        .await?;
    assert!(result.is_none());

    let result = ops.update_board(&BoardId::new(), BoardUpdate::new()).await?;
    assert!(result.is_none());

    Ok(())
}

#[tokio::test]
async fn test_empty_update_returns_unchanged_board() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let board = create_root(&ops, "Stable").await?;
    let same = ops
        .update_board(&board.id, BoardUpdate::new())
        .await?
        .expect("board exists");
    assert_eq!(same, board);

    Ok(())
}

// =========================================================================
// Queries
// =========================================================================

#[tokio::test]
async fn test_stats_scenario() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let grandparent = create_root(&ops, "Grandparent").await?;
    let parent1 = create_child(&ops, &grandparent, "Parent1").await?;
    let parent2 = create_child(&ops, &grandparent, "Parent2").await?;
    create_child(&ops, &parent1, "Child1").await?;
    create_child(&ops, &parent1, "Child2").await?;

    let stats = ops.get_stats(&grandparent.id).await?;
    assert_eq!(stats.direct_children, 2);
    assert_eq!(stats.total_descendants, 4);

    let stats = ops.get_stats(&parent2.id).await?;
    assert_eq!(stats.direct_children, 0);
    assert_eq!(stats.total_descendants, 0);

    let err = assert_err!(ops.get_stats(&BoardId::new()).await);
    assert!(matches!(err, BoardServiceError::NotFound { .. }));

    Ok(())
}

#[tokio::test]
async fn test_subtree_levels_and_order() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let grandparent = create_root(&ops, "Grandparent").await?;
    let parent = create_child(&ops, &grandparent, "Parent").await?;
    let child = create_child(&ops, &parent, "Child").await?;

    let subtree = ops.get_subtree(&grandparent.id).await?;
    let entries: Vec<(BoardId, u32)> = subtree.iter().map(|e| (e.board.id, e.level)).collect();
    assert_eq!(
        entries,
        vec![(grandparent.id, 0), (parent.id, 1), (child.id, 2)]
    );

    // Levels are relative to the requested board
    let subtree = ops.get_subtree(&parent.id).await?;
    assert_eq!(subtree.len(), 2);
    assert_eq!(subtree[1].level, 1);

    Ok(())
}

#[tokio::test]
async fn test_subtree_orders_siblings_by_creation_time() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let root = create_root(&ops, "Root").await?;
    let first = create_child(&ops, &root, "First").await?;
    let second = create_child(&ops, &root, "Second").await?;
    let nested = create_child(&ops, &first, "Nested").await?;
    let third = create_child(&ops, &root, "Third").await?;

    let ids: Vec<BoardId> = ops
        .get_subtree(&root.id)
        .await?
        .iter()
        .map(|e| e.board.id)
        .collect();
    assert_eq!(ids, vec![root.id, first.id, second.id, third.id, nested.id]);

    Ok(())
}

#[tokio::test]
async fn test_children_listed_newest_first() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let root = create_root(&ops, "Root").await?;
    let older = create_child(&ops, &root, "Older").await?;
    let newer = create_child(&ops, &root, "Newer").await?;

    let children = ops.get_children(&root.id).await?;
    let ids: Vec<BoardId> = children.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![newer.id, older.id]);

    assert!(ops.get_children(&BoardId::new()).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_ancestors_root_first() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let a = create_root(&ops, "A").await?;
    let b = create_child(&ops, &a, "B").await?;
    let c = create_child(&ops, &b, "C").await?;

    let ancestors: Vec<BoardId> = ops
        .get_ancestors(&c.id)
        .await?
        .iter()
        .map(|board| board.id)
        .collect();
    assert_eq!(ancestors, vec![a.id, b.id]);
    assert!(ops.get_ancestors(&a.id).await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_subtree_height() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let a = create_root(&ops, "A").await?;
    let b = create_child(&ops, &a, "B").await?;
    create_child(&ops, &b, "C").await?;

    assert_eq!(ops.queries().get_subtree_height(&a.id).await?, 2);
    assert_eq!(ops.queries().get_subtree_height(&b.id).await?, 1);

    Ok(())
}

#[tokio::test]
async fn test_unknown_ids_report_not_found() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;
    let missing = BoardId::new();

    assert!(ops.get_board(&missing).await?.is_none());
    assert!(matches!(
        assert_err!(ops.get_depth(&missing).await),
        BoardServiceError::NotFound { .. }
    ));
    assert!(matches!(
        assert_err!(ops.queries().get_depth_by_walk(&missing).await),
        BoardServiceError::NotFound { .. }
    ));
    assert!(matches!(
        assert_err!(ops.get_subtree(&missing).await),
        BoardServiceError::NotFound { .. }
    ));

    Ok(())
}

// =========================================================================
// Deletion
// =========================================================================

#[tokio::test]
async fn test_delete_cascades_to_descendants() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let grandparent = create_root(&ops, "Grandparent").await?;
    let parent = create_child(&ops, &grandparent, "Parent").await?;
    let child = create_child(&ops, &parent, "Child").await?;
    let sibling = create_child(&ops, &grandparent, "Sibling").await?;

    assert!(ops.delete_board(&parent.id).await?);

    let err = assert_err!(ops.get_depth(&child.id).await);
    assert!(matches!(err, BoardServiceError::NotFound { .. }));
    assert!(ops.get_board(&parent.id).await?.is_none());

    // Everything outside the subtree survives
    assert!(ops.get_board(&grandparent.id).await?.is_some());
    assert!(ops.get_board(&sibling.id).await?.is_some());
    assert_eq!(ops.list_boards().await?.len(), 2);

    assert_tree_consistent(&ops).await?;
    Ok(())
}

#[tokio::test]
async fn test_delete_leaf_removes_exactly_one() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    let root = create_root(&ops, "Root").await?;
    let leaf = create_child(&ops, &root, "Leaf").await?;
    create_child(&ops, &root, "Other").await?;

    assert!(ops.delete_board(&leaf.id).await?);
    assert_eq!(ops.list_boards().await?.len(), 2);

    // Second delete is a no-op
    assert!(!ops.delete_board(&leaf.id).await?);

    Ok(())
}

#[tokio::test]
async fn test_rejected_move_keeps_attributes_of_same_update() -> Result<()> {
    let (ops, _temp_dir) = create_test_env().await?;

    // Deepest board at depth 9, so a subtree of height 1 cannot go under it
    let chain = create_chain_unchecked(&ops, POLICY_MAX_DEPTH).await?;
    let deepest = chain.last().expect("chain");
    let mover = create_root(&ops, "Mover").await?;
    create_child(&ops, &mover, "Mover child").await?;

    let err = assert_err!(
        ops.update_board(
            &mover.id,
            BoardUpdate::new()
                .with_title("Renamed")
                .with_parent(Some(deepest.id)),
        )
        .await
    );
    assert!(matches!(
        err,
        BoardServiceError::MaxHierarchyDepthExceeded { depth: 11, max: 10 }
    ));

    let stored = ops.get_board(&mover.id).await?.expect("mover");
    assert_eq!(stored.title, "Mover");
    assert!(stored.is_root());
    assert_eq!(stored.updated_at, mover.updated_at);

    assert_tree_consistent(&ops).await
}
