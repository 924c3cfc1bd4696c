use lowering_ir::eval::{Evaluator, HostTensor};
use lowering_ir::{ElementType, IrGraph, OpIr, OperandHandle, PartialShape};
use onnx_lowering::{ConversionError, ErrorKind, SourceNode, lower_node};
use rstest::rstest;

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} != {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{actual:?} != {expected:?}");
    }
}

fn run(
    graph: &IrGraph,
    output: &OperandHandle,
    input: &OperandHandle,
    tensor: HostTensor,
) -> HostTensor {
    Evaluator::new(graph)
        .with_input(input, tensor)
        .evaluate(output)
        .unwrap()
}

fn lower(
    op_type: &str,
    opset: usize,
    axes: Option<Vec<i64>>,
    keepdims: i64,
    graph: &mut IrGraph,
    data: &OperandHandle,
) -> Result<Vec<OperandHandle>, ConversionError> {
    let mut builder = SourceNode::builder(op_type, "reduce")
        .opset(opset)
        .input("data")
        .attr_int("keepdims", keepdims);
    if let Some(axes) = axes {
        builder = builder.attr_ints("axes", axes);
    }
    lower_node(&builder.build(), std::slice::from_ref(data), graph)
}

#[rstest]
#[case::sum("ReduceSum", vec![6.0, 15.0])]
#[case::mean("ReduceMean", vec![2.0, 5.0])]
#[case::max("ReduceMax", vec![3.0, 6.0])]
#[case::min("ReduceMin", vec![1.0, 4.0])]
#[case::prod("ReduceProd", vec![6.0, 120.0])]
#[case::l1("ReduceL1", vec![6.0, 15.0])]
#[case::l2("ReduceL2", vec![14f64.sqrt(), 77f64.sqrt()])]
#[case::log_sum("ReduceLogSum", vec![6f64.ln(), 15f64.ln()])]
#[case::sum_square("ReduceSumSquare", vec![14.0, 77.0])]
fn reduce_last_axis(#[case] op_type: &str, #[case] expected: Vec<f64>) {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Float64, PartialShape::from_static(&[2, 3]));

    let outputs = lower(op_type, 11, Some(vec![-1]), 0, &mut graph, &data).unwrap();
    assert_eq!(outputs.len(), 1);
    assert_eq!(outputs[0].shape(), &PartialShape::from_static(&[2]));

    let tensor = HostTensor::from_vec(
        ElementType::Float64,
        &[2, 3],
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
    )
    .unwrap();
    let result = run(&graph, &outputs[0], &data, tensor);
    assert_eq!(result.shape(), &[2]);
    assert_close(&result.to_vec(), &expected);
}

#[test]
fn log_sum_exp_exponentiates_before_reducing() {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Float32, PartialShape::from_static(&[1, 3]));

    let outputs = lower("ReduceLogSumExp", 13, Some(vec![1]), 1, &mut graph, &data).unwrap();
    assert_eq!(outputs[0].shape(), &PartialShape::from_static(&[1, 1]));

    let tensor =
        HostTensor::from_vec(ElementType::Float32, &[1, 3], vec![0.0, 0.0, 2f64.ln()]).unwrap();
    let result = run(&graph, &outputs[0], &data, tensor);
    assert_eq!(result.shape(), &[1, 1]);
    assert_close(&result.to_vec(), &[4f64.ln()]);
}

#[test]
fn dynamic_rank_reduces_every_axis() {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Float32, PartialShape::Dynamic);

    let outputs = lower("ReduceSum", 1, None, 0, &mut graph, &data).unwrap();
    assert!(
        graph
            .nodes()
            .iter()
            .any(|node| matches!(node.op, OpIr::Range { .. }))
    );

    let tensor =
        HostTensor::from_vec(ElementType::Float32, &[2, 2], vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let result = run(&graph, &outputs[0], &data, tensor);
    assert!(result.shape().is_empty());
    assert_close(&result.to_vec(), &[10.0]);
}

#[test]
fn dynamic_rank_axes_expression_yields_all_axes() {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Float32, PartialShape::Dynamic);

    let outputs = lower("ReduceMax", 1, None, 1, &mut graph, &data).unwrap();
    let reduce = graph.producer(&outputs[0]).unwrap();
    let axes = graph.node(reduce.inputs[1]).unwrap().output.clone();

    let tensor = HostTensor::from_vec(ElementType::Float32, &[2, 3], vec![0.0; 6]).unwrap();
    let result = run(&graph, &axes, &data, tensor);
    assert_eq!(result.elem_type, ElementType::Int64);
    assert_close(&result.to_vec(), &[0.0, 1.0]);
}

#[rstest]
#[case::static_rank(PartialShape::scalar())]
#[case::dynamic_rank(PartialShape::Dynamic)]
fn scalar_input_is_unchanged(#[case] shape: PartialShape) {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Float32, shape);

    let outputs = lower("ReduceMean", 11, None, 1, &mut graph, &data).unwrap();

    let tensor = HostTensor::from_vec(ElementType::Float32, &[], vec![2.5]).unwrap();
    let result = run(&graph, &outputs[0], &data, tensor);
    assert!(result.shape().is_empty());
    assert_close(&result.to_vec(), &[2.5]);
}

#[test]
fn noop_with_empty_axes_returns_input() {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Float32, PartialShape::from_static(&[2, 3]));
    let axes = graph.parameter(ElementType::Int64, PartialShape::from_static(&[0]));
    let before = graph.len();

    let node = SourceNode::builder("ReduceSum", "noop")
        .opset(13)
        .input("data")
        .input("axes")
        .attr_int("noop_with_empty_axes", 1)
        .build();
    let outputs = lower_node(&node, &[data.clone(), axes], &mut graph).unwrap();

    assert_eq!(outputs.len(), 1);
    assert!(outputs[0].same_value(&data));
    assert_eq!(graph.len(), before);
}

#[test]
fn runtime_axes_input() {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Float64, PartialShape::from_static(&[2, 3]));
    let axes = graph.parameter(ElementType::Int64, PartialShape::from_static(&[1]));

    let node = SourceNode::builder("ReduceMin", "min")
        .opset(18)
        .input("data")
        .input("axes")
        .attr_int("keepdims", 0)
        .build();
    let outputs = lower_node(&node, &[data.clone(), axes.clone()], &mut graph).unwrap();
    assert_eq!(outputs[0].shape(), &PartialShape::Dynamic);

    let result = Evaluator::new(&graph)
        .with_input(
            &data,
            HostTensor::from_vec(
                ElementType::Float64,
                &[2, 3],
                vec![3.0, 1.0, 2.0, -1.0, 5.0, 4.0],
            )
            .unwrap(),
        )
        .with_input(
            &axes,
            HostTensor::from_vec(ElementType::Int64, &[1], vec![0.0]).unwrap(),
        )
        .evaluate(&outputs[0])
        .unwrap();
    assert_close(&result.to_vec(), &[-1.0, 1.0, 2.0]);
}

#[test]
fn repeated_runtime_axes_keep_shape_consistent() {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Float32, PartialShape::from_static(&[2, 3, 4]));
    let axes = graph.parameter(ElementType::Int64, PartialShape::from_static(&[2]));

    let node = SourceNode::builder("ReduceMin", "min")
        .opset(18)
        .input("data")
        .input("axes")
        .attr_int("keepdims", 0)
        .build();
    let outputs = lower_node(&node, &[data.clone(), axes.clone()], &mut graph).unwrap();

    let result = Evaluator::new(&graph)
        .with_input(
            &data,
            HostTensor::from_vec(ElementType::Float32, &[2, 3, 4], vec![1.0; 24]).unwrap(),
        )
        .with_input(
            &axes,
            HostTensor::from_vec(ElementType::Int64, &[2], vec![0.0, -3.0]).unwrap(),
        )
        .evaluate(&outputs[0])
        .unwrap();

    assert_eq!(result.shape(), &[3, 4]);
    if let Some(rank) = outputs[0].rank() {
        assert_eq!(rank, result.shape().len());
    }
}

#[test]
fn float_axes_input_rejected() {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Float32, PartialShape::from_static(&[2, 3]));
    let axes = graph.parameter(ElementType::Float32, PartialShape::from_static(&[1]));
    let before = graph.len();

    let node = SourceNode::builder("ReduceMean", "mean")
        .opset(18)
        .input("data")
        .input("axes")
        .build();
    let result = lower_node(&node, &[data, axes], &mut graph);

    assert!(matches!(
        result,
        Err(ConversionError {
            kind: ErrorKind::UnsupportedElementType {
                elem_type: ElementType::Float32
            },
            ..
        })
    ));
    assert_eq!(graph.len(), before);
}

#[test]
fn unsupported_type_leaves_graph_untouched() {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Bool, PartialShape::Dynamic);
    let before = graph.len();

    let result = lower("ReduceSum", 1, None, 1, &mut graph, &data);
    assert!(matches!(
        result,
        Err(ConversionError {
            kind: ErrorKind::UnsupportedElementType {
                elem_type: ElementType::Bool
            },
            ..
        })
    ));
    assert_eq!(graph.len(), before);
}

#[rstest]
#[case(12, false)]
#[case(13, true)]
fn bfloat16_accepted_from_opset_13(#[case] opset: usize, #[case] accepted: bool) {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::BFloat16, PartialShape::from_static(&[4]));

    let result = lower("ReduceSum", opset, None, 1, &mut graph, &data);
    assert_eq!(result.is_ok(), accepted);
}

#[test]
fn axes_attribute_ignored_once_axes_are_an_input() {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Float32, PartialShape::from_static(&[2, 3]));

    // From opset 13 on the axes come from the second input; with none given every
    // axis is reduced.
    let outputs = lower("ReduceSum", 13, Some(vec![0]), 0, &mut graph, &data).unwrap();

    let tensor = HostTensor::from_vec(ElementType::Float32, &[2, 3], vec![1.0; 6]).unwrap();
    let result = run(&graph, &outputs[0], &data, tensor);
    assert_close(&result.to_vec(), &[6.0]);
}

#[test]
fn errors_report_node_and_operator() {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::Float32, PartialShape::from_static(&[2]));

    let err = lower("ReduceSum", 0, None, 1, &mut graph, &data).unwrap_err();
    assert_eq!(err.op_type, "ReduceSum");
    assert_eq!(err.location, "node 'reduce'");
    assert_eq!(
        err.kind,
        ErrorKind::UnsupportedOperatorVersion {
            version: 0,
            earliest: 1
        }
    );

    let err = lower("ReduceAll", 13, None, 1, &mut graph, &data).unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnsupportedOperator);
    assert!(err.to_string().starts_with("ReduceAll (node 'reduce')"));
}

#[test]
fn identity_operator() {
    let mut graph = IrGraph::new();
    let data = graph.parameter(ElementType::String, PartialShape::Dynamic);

    let node = SourceNode::builder("Identity", "id").input("data").build();
    let outputs = lower_node(&node, std::slice::from_ref(&data), &mut graph).unwrap();
    assert!(outputs[0].same_value(&data));
}
